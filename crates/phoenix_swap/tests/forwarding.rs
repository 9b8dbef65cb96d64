//! `#[forwarding]` proxies used through their trait, from threads and tasks.

mod common;

use std::sync::Arc;

use common::{Library, Pool};
use phoenix_swap::{
    ConstructionParams, ForwardingProxy, Properties, RefreshCoordinator, ResourceRegistry,
    StrategySet, forwarding,
};

#[forwarding]
trait Counter: Send + Sync {
    fn get(&self) -> u64;
    fn describe(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.get())
    }
}

/// Not dyn compatible, so only usable with sized resources.
#[forwarding]
trait Convert: Send + Sync {
    fn get_as<T: From<u64>>(&self) -> T;
    fn add_to(&self, values: impl IntoIterator<Item = u64>) -> u64;
}

struct Fixed(u64);

impl Counter for Fixed {
    fn get(&self) -> u64 {
        self.0
    }
}

impl Convert for Fixed {
    fn get_as<T: From<u64>>(&self) -> T {
        T::from(self.0)
    }

    fn add_to(&self, values: impl IntoIterator<Item = u64>) -> u64 {
        values.into_iter().sum::<u64>() + self.0
    }
}

struct Custom;

impl Counter for Custom {
    fn get(&self) -> u64 {
        0
    }

    fn describe(&self, _prefix: &str) -> String {
        "custom".into()
    }
}

fn total(counter: &impl Convert) -> u64 {
    counter.add_to([1, 2, 3])
}

#[test]
fn proxy_implements_the_trait_for_sized_resources() {
    let registry = ResourceRegistry::<Fixed>::new();
    let counter = registry
        .register(Arc::new(Fixed(10)), ConstructionParams::named("c", Properties::new()))
        .unwrap();

    assert_eq!(counter.get(), 10);
    assert_eq!(counter.get_as::<u128>(), 10u128);
    assert_eq!(total(&counter), 16);
    assert_eq!(counter.describe("n="), "n=10");
}

#[test]
fn proxy_forwards_overridden_defaults() {
    let registry = ResourceRegistry::<dyn Counter>::new();
    let counter = registry
        .register(Arc::new(Custom), ConstructionParams::named("c", Properties::new()))
        .unwrap();

    assert_eq!(counter.describe("n="), "custom");
}

#[test]
fn proxy_can_be_boxed_as_the_trait() {
    let registry = ResourceRegistry::<dyn Counter>::new();
    let proxy = registry
        .register(Arc::new(Fixed(4)), ConstructionParams::named("c", Properties::new()))
        .unwrap();

    let erased: Box<dyn Counter> = Box::new(proxy.clone());
    assert_eq!(erased.get(), 4);

    // A proxy to a proxy still reaches the instance.
    let nested = ResourceRegistry::<ForwardingProxy<dyn Counter>>::new();
    let outer = nested
        .register(Arc::new(proxy), ConstructionParams::named("outer", Properties::new()))
        .unwrap();
    assert_eq!(outer.get(), 4);
}

#[test]
fn operation_errors_are_not_intercepted() {
    let library = Library::new("4.3.0");
    let registry = ResourceRegistry::<dyn Pool>::new();
    let params = ConstructionParams::named("orders", Properties::new());
    let pool = registry.register(library.open(&params), params).unwrap();

    let err = pool.checkout("").unwrap_err();
    assert_eq!(err, format!("pool {} refuses anonymous clients", pool.id()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tasks_forward_while_refreshes_run() {
    let library = Library::new("3.6.1");
    let shared = Arc::new(library.clone());
    let coordinator = Arc::new(RefreshCoordinator::new(
        ResourceRegistry::new(),
        shared.clone(),
        StrategySet::<dyn Pool>::from_bootstraps(shared.clone(), shared),
    ));
    let params = ConstructionParams::named("orders", Properties::new());
    let pool = coordinator
        .registry()
        .register(library.open(&params), params)
        .unwrap();

    let refresher = {
        let coordinator = Arc::clone(&coordinator);
        tokio::task::spawn_blocking(move || {
            for _ in 0..10 {
                coordinator.refresh_all();
            }
        })
    };

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                let mut ids = Vec::new();
                for _ in 0..20 {
                    // Hold a snapshot across an await point.
                    let instance = pool.snapshot();
                    tokio::task::yield_now().await;
                    ids.push(instance.id());
                }
                ids
            })
        })
        .collect();

    refresher.await.unwrap();
    let built = library.built();
    for task in tasks {
        for id in task.await.unwrap() {
            assert!(built.contains(&id));
        }
    }
    assert_eq!(pool.handle().generation(), 10);
}
