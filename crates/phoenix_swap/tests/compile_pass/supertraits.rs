use std::sync::Arc;

use phoenix_swap::{ConstructionParams, Properties, ResourceRegistry, forwarding};

#[forwarding]
pub trait Named: Send + Sync {
    fn name(&self) -> String;
}

#[forwarding]
pub trait Pool: Named {
    fn size(&self) -> usize;
}

struct Fixed;

impl Named for Fixed {
    fn name(&self) -> String {
        "fixed".into()
    }
}

impl Pool for Fixed {
    fn size(&self) -> usize {
        1
    }
}

fn describe(pool: &impl Pool) -> String {
    format!("{} ({})", pool.name(), pool.size())
}

fn main() {
    let registry = ResourceRegistry::<dyn Pool>::new();
    let proxy = registry
        .register(Arc::new(Fixed), ConstructionParams::named("fixed", Properties::new()))
        .unwrap();
    let _ = describe(&proxy);
}
