use std::sync::Arc;

use phoenix_swap::{ConstructionParams, ForwardingProxy, Properties, ResourceRegistry, forwarding};

#[forwarding]
pub trait Engine: Send + Sync {
    fn render(&self, template: &str, values: &[(&str, &str)]) -> String;
    fn name(&self) -> &'static str;
    fn check(&self) -> Result<(), String>;
}

struct Plain;

impl Engine for Plain {
    fn render(&self, template: &str, _values: &[(&str, &str)]) -> String {
        template.to_owned()
    }

    fn name(&self) -> &'static str {
        "plain"
    }

    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

fn use_engine(engine: &dyn Engine) -> String {
    engine.render(engine.name(), &[])
}

fn main() {
    let registry = ResourceRegistry::<dyn Engine>::new();
    let proxy: ForwardingProxy<dyn Engine> = registry
        .register(Arc::new(Plain), ConstructionParams::named("engine", Properties::new()))
        .unwrap();
    let _ = use_engine(&proxy);
    let _ = proxy.check();
}
