//! Plugin capability and the host-side scheduler that drives it

use crate::bag::EventBag;
use gazelink_core::{Error, Result};
use tracing::{debug, error, info, warn};

/// Capability every gazelink plugin implements.
///
/// The host calls `on_attach` once, then `on_cycle` with each cycle's event
/// bag and `on_render` whenever it redraws, and finally `on_detach`.
pub trait Plugin: Send {
    /// Unique name within a host
    fn name(&self) -> &str;

    /// Position in the chain, lower runs earlier
    fn order(&self) -> f64 {
        0.5
    }

    fn on_attach(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_detach(&mut self) {}

    /// Handle one cycle. Plugins may append derived channels to the bag.
    fn on_cycle(&mut self, bag: &mut EventBag) -> Result<()>;

    fn on_render(&mut self) {}
}

/// Runs attached plugins in `order` on every cycle
#[derive(Default)]
pub struct PluginHost {
    plugins: Vec<Box<dyn Plugin>>,
    cycles: u64,
}

impl PluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a plugin. Fails on duplicate names or when the plugin's own
    /// `on_attach` fails; in both cases it is not registered.
    pub fn attach(&mut self, mut plugin: Box<dyn Plugin>) -> Result<()> {
        let name = plugin.name().to_string();
        if self.plugins.iter().any(|p| p.name() == name) {
            return Err(Error::Plugin(format!("plugin '{}' already attached", name)));
        }

        plugin.on_attach()?;

        // insert after every plugin with order <= this one, keeping attach order for ties
        let order = plugin.order();
        let position = self
            .plugins
            .iter()
            .position(|p| p.order() > order)
            .unwrap_or(self.plugins.len());
        self.plugins.insert(position, plugin);

        info!("Attached plugin '{}' (order {})", name, order);
        Ok(())
    }

    /// Detach a plugin by name. Returns whether it was attached.
    pub fn detach(&mut self, name: &str) -> bool {
        match self.plugins.iter().position(|p| p.name() == name) {
            Some(index) => {
                let mut plugin = self.plugins.remove(index);
                plugin.on_detach();
                info!("Detached plugin '{}'", name);
                true
            }
            None => {
                warn!("No plugin named '{}' to detach", name);
                false
            }
        }
    }

    pub fn detach_all(&mut self) {
        for mut plugin in self.plugins.drain(..).rev() {
            plugin.on_detach();
            debug!("Detached plugin '{}'", plugin.name());
        }
    }

    /// Run one cycle over the bag. Plugin failures are logged and the
    /// remaining plugins still run. Returns the number of failures.
    pub fn run_cycle(&mut self, bag: &mut EventBag) -> usize {
        self.cycles += 1;
        let mut failures = 0;

        for plugin in self.plugins.iter_mut() {
            if let Err(e) = plugin.on_cycle(bag) {
                error!("Plugin '{}' failed in cycle {}: {}", plugin.name(), self.cycles, e);
                failures += 1;
            }
        }

        failures
    }

    pub fn render(&mut self) {
        for plugin in self.plugins.iter_mut() {
            plugin.on_render();
        }
    }

    /// Plugin names in execution order
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl Drop for PluginHost {
    fn drop(&mut self) {
        self.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::ChannelPayload;
    use serde_json::json;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Recorder {
        name: String,
        order: f64,
        log: Arc<Mutex<Vec<String>>>,
        fail_cycle: bool,
        fail_attach: bool,
    }

    impl Recorder {
        fn boxed(name: &str, order: f64, log: &Arc<Mutex<Vec<String>>>) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                order,
                log: log.clone(),
                fail_cycle: false,
                fail_attach: false,
            })
        }
    }

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn order(&self) -> f64 {
            self.order
        }

        fn on_attach(&mut self) -> Result<()> {
            if self.fail_attach {
                return Err(Error::Plugin("attach refused".to_string()));
            }
            Ok(())
        }

        fn on_detach(&mut self) {
            self.log.lock().push(format!("detach:{}", self.name));
        }

        fn on_cycle(&mut self, bag: &mut EventBag) -> Result<()> {
            self.log.lock().push(format!("cycle:{}", self.name));
            bag.insert(self.name.clone(), ChannelPayload::Other(json!(true)));
            if self.fail_cycle {
                return Err(Error::Plugin("boom".to_string()));
            }
            Ok(())
        }

        fn on_render(&mut self) {
            self.log.lock().push(format!("render:{}", self.name));
        }
    }

    #[test]
    fn test_plugins_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut host = PluginHost::new();
        host.attach(Recorder::boxed("late", 0.9, &log)).unwrap();
        host.attach(Recorder::boxed("early", 0.1, &log)).unwrap();
        host.attach(Recorder::boxed("middle_a", 0.5, &log)).unwrap();
        host.attach(Recorder::boxed("middle_b", 0.5, &log)).unwrap();

        assert_eq!(host.plugin_names(), vec!["early", "middle_a", "middle_b", "late"]);

        let mut bag = EventBag::new();
        assert_eq!(host.run_cycle(&mut bag), 0);
        assert_eq!(bag.len(), 4);
        assert_eq!(
            *log.lock(),
            vec!["cycle:early", "cycle:middle_a", "cycle:middle_b", "cycle:late"]
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut host = PluginHost::new();
        host.attach(Recorder::boxed("bridge", 0.5, &log)).unwrap();
        assert!(host.attach(Recorder::boxed("bridge", 0.7, &log)).is_err());
        assert_eq!(host.len(), 1);
    }

    #[test]
    fn test_failed_attach_not_registered() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut host = PluginHost::new();
        let mut plugin = Recorder::boxed("broken", 0.5, &log);
        plugin.fail_attach = true;
        assert!(host.attach(plugin).is_err());
        assert!(host.is_empty());
    }

    #[test]
    fn test_failing_plugin_does_not_abort_cycle() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut host = PluginHost::new();
        let mut failing = Recorder::boxed("failing", 0.1, &log);
        failing.fail_cycle = true;
        host.attach(failing).unwrap();
        host.attach(Recorder::boxed("after", 0.2, &log)).unwrap();

        let mut bag = EventBag::new();
        assert_eq!(host.run_cycle(&mut bag), 1);
        assert!(bag.contains("after"));
        assert_eq!(host.cycles(), 1);
    }

    #[test]
    fn test_render_and_detach() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut host = PluginHost::new();
        host.attach(Recorder::boxed("a", 0.1, &log)).unwrap();
        host.attach(Recorder::boxed("b", 0.2, &log)).unwrap();

        host.render();
        assert!(host.detach("a"));
        assert!(!host.detach("a"));
        drop(host);

        assert_eq!(
            *log.lock(),
            vec!["render:a", "render:b", "detach:a", "detach:b"]
        );
    }
}
