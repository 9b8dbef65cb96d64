//! A fake connection-pool library shared by the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, mpsc};

use parking_lot::Mutex;
use phoenix_swap::{
    BoxError, Capability, ConstructionParams, Descriptor, LegacyBootstrap, LegacyConfiguration,
    ModernBootstrap, Properties, ResourceBuilder, VersionProbe, forwarding,
};
use tracing_subscriber::fmt::MakeWriter;

#[forwarding]
pub trait Pool: Send + Sync {
    /// Serial number of the build that produced this instance.
    fn id(&self) -> u64;
    fn url(&self) -> String;
    fn built_by(&self) -> Capability;
    fn checkout(&self, client: &str) -> Result<u64, String>;
}

#[derive(Debug)]
pub struct PoolInstance {
    pub id: u64,
    pub url: String,
    pub built_by: Capability,
}

impl Pool for PoolInstance {
    fn id(&self) -> u64 {
        self.id
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn built_by(&self) -> Capability {
        self.built_by
    }

    fn checkout(&self, client: &str) -> Result<u64, String> {
        if client.is_empty() {
            Err(format!("pool {} refuses anonymous clients", self.id))
        } else {
            Ok(self.id)
        }
    }
}

/// Library-side description used by the detailed construction form.
pub struct UnitInfo {
    pub url: String,
}

/// Blocks the next build until released.
pub struct Gate {
    pub entered: mpsc::Receiver<()>,
    pub release: mpsc::Sender<()>,
}

#[derive(Default)]
struct Shared {
    version: Mutex<String>,
    next_id: AtomicU64,
    built: Mutex<Vec<u64>>,
    broken: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    fail_deregister: AtomicBool,
    calls: Mutex<Vec<String>>,
    gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
}

impl Shared {
    fn log(&self, line: impl Into<String>) {
        self.calls.lock().push(line.into());
    }

    fn make(&self, name: &str, url: String, built_by: Capability) -> Result<Arc<dyn Pool>, BoxError> {
        let gate = self.gate.lock().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.recv();
        }

        if self.panicking.lock().contains(name) {
            panic!("driver crashed while building {name}");
        }
        if self.broken.lock().contains(name) {
            return Err(format!("cannot connect to {url}").into());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.built.lock().push(id);
        Ok(Arc::new(PoolInstance { id, url, built_by }))
    }
}

fn url_from(name: &str, properties: &Properties) -> String {
    properties
        .get("url")
        .and_then(|url| url.as_str())
        .map_or_else(|| format!("db://{name}"), str::to_owned)
}

#[derive(Clone, Default)]
pub struct Library {
    shared: Arc<Shared>,
}

impl Library {
    pub fn new(version: &str) -> Self {
        let library = Self::default();
        library.set_version(version);
        library
    }

    pub fn set_version(&self, version: &str) {
        *self.shared.version.lock() = version.to_owned();
    }

    pub fn break_resource(&self, name: &str) {
        self.shared.broken.lock().insert(name.to_owned());
    }

    pub fn repair_resource(&self, name: &str) {
        self.shared.broken.lock().remove(name);
    }

    pub fn panic_on(&self, name: &str) {
        self.shared.panicking.lock().insert(name.to_owned());
    }

    pub fn fail_deregister(&self) {
        self.shared.fail_deregister.store(true, Ordering::SeqCst);
    }

    /// Makes the next build wait until the returned gate is released.
    pub fn gate_next_build(&self) -> Gate {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.shared.gate.lock() = Some((entered_tx, release_rx));
        Gate {
            entered: entered_rx,
            release: release_tx,
        }
    }

    /// Every id handed out so far.
    pub fn built(&self) -> Vec<u64> {
        self.shared.built.lock().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.shared.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.shared.calls.lock().clear();
    }

    /// Builds a first instance outside of any refresh.
    pub fn open(&self, params: &ConstructionParams) -> Arc<dyn Pool> {
        let url = match params.descriptor() {
            Some(descriptor) => descriptor
                .downcast_ref::<UnitInfo>()
                .map(|unit| unit.url.clone())
                .unwrap_or_default(),
            None => url_from(params.name(), params.properties()),
        };
        self.shared
            .make(params.name(), url, Capability::Legacy)
            .expect("initial build")
    }
}

impl VersionProbe for Library {
    fn version_string(&self) -> String {
        self.shared.version.lock().clone()
    }
}

struct Builder {
    shared: Arc<Shared>,
    name: String,
    url: String,
}

impl ResourceBuilder<dyn Pool> for Builder {
    fn build(self: Box<Self>) -> Result<Arc<dyn Pool>, BoxError> {
        let Builder { shared, name, url } = *self;
        shared.log(format!("builder.build({name})"));
        shared.make(&name, url, Capability::Modern)
    }
}

impl ModernBootstrap<dyn Pool> for Library {
    fn create(&self, name: &str, properties: &Properties) -> Result<Arc<dyn Pool>, BoxError> {
        self.shared.log(format!("create({name})"));
        self.shared.make(name, url_from(name, properties), Capability::Modern)
    }

    fn builder(
        &self,
        descriptor: &Descriptor,
        _properties: &Properties,
    ) -> Result<Box<dyn ResourceBuilder<dyn Pool>>, BoxError> {
        let unit = descriptor
            .downcast_ref::<UnitInfo>()
            .ok_or("descriptor is not a UnitInfo")?;
        self.shared.log(format!("builder({})", unit.url));
        Ok(Box::new(Builder {
            shared: Arc::clone(&self.shared),
            name: unit.url.trim_start_matches("db://").to_owned(),
            url: unit.url.clone(),
        }))
    }
}

struct Configuration {
    shared: Arc<Shared>,
    target: Option<(String, String)>,
}

impl LegacyConfiguration<dyn Pool> for Configuration {
    fn configure_descriptor(&mut self, descriptor: &Descriptor, _properties: &Properties) -> Result<(), BoxError> {
        let unit = descriptor
            .downcast_ref::<UnitInfo>()
            .ok_or("descriptor is not a UnitInfo")?;
        self.shared.log(format!("configure_descriptor({})", unit.url));
        let name = unit.url.trim_start_matches("db://").to_owned();
        self.target = Some((name, unit.url.clone()));
        Ok(())
    }

    fn configure_named(&mut self, name: &str, properties: &Properties) -> Result<(), BoxError> {
        self.shared.log(format!("configure_named({name})"));
        self.target = Some((name.to_owned(), url_from(name, properties)));
        Ok(())
    }

    fn build(self: Box<Self>) -> Result<Arc<dyn Pool>, BoxError> {
        let Configuration { shared, target } = *self;
        let (name, url) = target.ok_or("configuration used before configure")?;
        shared.log(format!("configuration.build({name})"));
        shared.make(&name, url, Capability::Legacy)
    }
}

impl LegacyBootstrap<dyn Pool> for Library {
    fn new_configuration(&self) -> Result<Box<dyn LegacyConfiguration<dyn Pool>>, BoxError> {
        self.shared.log("new_configuration");
        Ok(Box::new(Configuration {
            shared: Arc::clone(&self.shared),
            target: None,
        }))
    }

    fn deregister(&self, name: &str, instance: &Arc<dyn Pool>) -> Result<(), BoxError> {
        self.shared.log(format!("deregister({name}, {})", instance.id()));
        if self.shared.fail_deregister.load(Ordering::SeqCst) {
            return Err("internal registry is sealed".into());
        }
        Ok(())
    }
}

/// Log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a subscriber that records every event on this thread.
pub fn with_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs.contents())
}
