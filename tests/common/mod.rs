#![allow(dead_code)]

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a fresh temporary file with the given extension.
    /// The file is removed when the handle drops.
    pub fn create_temp_file(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("brrtmvc_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_file(content, "yaml")
    }
}

pub mod fixtures {
    use brrtmvc::handler::HandlerMethod;
    use brrtmvc::mapping::{HandlerRegistry, RequestCriteria};
    use http::Method;
    use std::sync::Arc;

    /// Registry with one `path` + `method` mapping per entry.
    pub fn registry(entries: &[(&str, Option<Method>, Arc<HandlerMethod>)]) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        for (path, method, handler) in entries {
            let mut builder = RequestCriteria::builder().path(*path);
            if let Some(method) = method {
                builder = builder.method(method.clone());
            }
            registry
                .register(builder.build().unwrap(), Arc::clone(handler))
                .unwrap();
        }
        registry
    }
}

pub mod log_capture {
    use parking_lot::Mutex;
    use std::fmt;
    use std::sync::Arc;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    /// One captured event: level, message and the rendered fields.
    #[derive(Debug, Clone)]
    pub struct CapturedEvent {
        pub level: tracing::Level,
        pub message: String,
        pub fields: Vec<(String, String)>,
    }

    impl CapturedEvent {
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
        }
    }

    #[derive(Default)]
    struct Collect {
        message: String,
        fields: Vec<(String, String)>,
    }

    impl Visit for Collect {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.message = format!("{value:?}");
            } else {
                self.fields.push((field.name().to_string(), format!("{value:?}")));
            }
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "message" {
                self.message = value.to_string();
            } else {
                self.fields.push((field.name().to_string(), value.to_string()));
            }
        }
    }

    struct CaptureLayer {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    impl<S: Subscriber> Layer<S> for CaptureLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut collect = Collect::default();
            event.record(&mut collect);
            self.events.lock().push(CapturedEvent {
                level: *event.metadata().level(),
                message: collect.message,
                fields: collect.fields,
            });
        }
    }

    /// Captures events on the current thread while alive.
    pub struct CapturedLogs {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
        _guard: tracing::subscriber::DefaultGuard,
    }

    impl CapturedLogs {
        pub fn init() -> Self {
            let events = Arc::new(Mutex::new(Vec::new()));
            let subscriber = Registry::default().with(CaptureLayer {
                events: Arc::clone(&events),
            });
            let guard = tracing::subscriber::set_default(subscriber);
            Self {
                events,
                _guard: guard,
            }
        }

        pub fn events(&self) -> Vec<CapturedEvent> {
            self.events.lock().clone()
        }

        pub fn find(&self, message: &str) -> Option<CapturedEvent> {
            self.events().into_iter().find(|e| e.message == message)
        }
    }
}
