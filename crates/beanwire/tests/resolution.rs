//! Single-bean resolution: priority selection, scope behavior and failure
//! modes of `get_bean`.

use std::sync::Arc;

use beanwire::{Boundary, Context, Error, capability, injectable};

#[capability]
pub trait Greeter: Send + Sync {
    fn style(&self) -> &'static str;
}

#[injectable(capability = Greeter, singleton, priority = 2)]
#[derive(Default)]
pub struct Formal;

impl Greeter for Formal {
    fn style(&self) -> &'static str {
        "formal"
    }
}

#[injectable(capability = Greeter, singleton, priority = 1)]
#[derive(Default)]
pub struct Casual;

impl Greeter for Casual {
    fn style(&self) -> &'static str {
        "casual"
    }
}

#[capability]
pub trait Fallback: Send + Sync {
    fn label(&self) -> &'static str;
}

#[injectable(capability = Fallback, singleton)]
#[derive(Default)]
pub struct Unranked;

impl Fallback for Unranked {
    fn label(&self) -> &'static str {
        "unranked"
    }
}

#[injectable(capability = Fallback, singleton, priority = 3)]
#[derive(Default)]
pub struct Ranked;

impl Fallback for Ranked {
    fn label(&self) -> &'static str {
        "ranked"
    }
}

#[capability]
pub trait Ticket: Send + Sync {
    fn stamp(&self) -> &'static str;
}

#[injectable(capability = Ticket, prototype, priority = 1)]
#[derive(Default)]
pub struct PaperTicket;

impl Ticket for PaperTicket {
    fn stamp(&self) -> &'static str {
        "paper"
    }
}

#[capability]
pub trait Absent: Send + Sync {}

#[capability]
pub trait Router: Send + Sync {
    fn side(&self) -> &'static str;
}

#[injectable(capability = Router, singleton, priority = 5)]
#[derive(Default)]
pub struct LeftRouter;

impl Router for LeftRouter {
    fn side(&self) -> &'static str {
        "left"
    }
}

#[injectable(capability = Router, singleton, priority = 5)]
#[derive(Default)]
pub struct RightRouter;

impl Router for RightRouter {
    fn side(&self) -> &'static str {
        "right"
    }
}

fn as_unit<T: ?Sized>(arc: &Arc<T>) -> *const () {
    Arc::as_ptr(arc) as *const ()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn lowest_priority_ordinal_wins() {
    init_tracing();
    let context = Context::instance_of(Boundary("resolution_priority"));
    let greeter = context.get_bean::<dyn Greeter>().unwrap();
    assert_eq!(greeter.style(), "casual");
}

#[test]
fn missing_ordinal_means_lowest_precedence() {
    let context = Context::instance_of(Boundary("resolution_default_priority"));
    let fallback = context.get_bean::<dyn Fallback>().unwrap();
    assert_eq!(fallback.label(), "ranked");
}

#[test]
fn singleton_is_one_instance_under_both_keys() {
    let context = Context::instance_of(Boundary("resolution_singleton"));
    let first = context.get_bean::<dyn Greeter>().unwrap();
    let second = context.get_bean::<dyn Greeter>().unwrap();
    let concrete = context.get_bean::<Casual>().unwrap();
    assert_eq!(as_unit(&first), as_unit(&second));
    assert_eq!(as_unit(&first), as_unit(&concrete));
}

#[test]
fn prototype_is_fresh_per_request() {
    let context = Context::instance_of(Boundary("resolution_prototype"));
    let first = context.get_bean::<dyn Ticket>().unwrap();
    let second = context.get_bean::<dyn Ticket>().unwrap();
    assert_eq!(first.stamp(), "paper");
    assert_ne!(as_unit(&first), as_unit(&second));
}

#[test]
fn unregistered_capability_fails_hard() {
    let context = Context::instance_of(Boundary("resolution_not_found"));
    let Err(err) = context.get_bean::<dyn Absent>() else {
        panic!("expected resolution to fail");
    };
    assert!(matches!(err, Error::NotFound { .. }));
    assert!(err.to_string().contains("Absent"));
}

#[test]
fn name_does_not_narrow_the_candidate_set() {
    let context = Context::instance_of(Boundary("resolution_named"));
    let by_name = context
        .get_bean_named::<dyn Greeter>("no_such_bean")
        .unwrap();
    let plain = context.get_bean::<dyn Greeter>().unwrap();
    assert_eq!(by_name.style(), "casual");
    assert_eq!(as_unit(&by_name), as_unit(&plain));
}

#[test]
fn concrete_lookup_of_a_loser_keeps_the_capability_binding() {
    let context = Context::instance_of(Boundary("resolution_loser"));
    let formal = context.get_bean::<Formal>().unwrap();
    assert_eq!(formal.style(), "formal");
    let winner = context.get_bean::<dyn Greeter>().unwrap();
    assert_eq!(winner.style(), "casual");
    assert_ne!(as_unit(&winner), as_unit(&formal));
}

#[test]
fn equal_priorities_warn_but_resolve_stably() {
    init_tracing();
    let context = Context::instance_of(Boundary("resolution_ambiguous"));
    let first = context.get_bean::<dyn Router>().unwrap();
    let second = context.get_bean::<dyn Router>().unwrap();
    assert!(matches!(first.side(), "left" | "right"));
    assert_eq!(as_unit(&first), as_unit(&second));
}

#[test]
fn boundaries_hold_separate_singletons() {
    let left = Context::instance_of(Boundary("resolution_iso_left"));
    let right = Context::instance_of(Boundary("resolution_iso_right"));
    let in_left = left.get_bean::<dyn Greeter>().unwrap();
    let in_right = right.get_bean::<dyn Greeter>().unwrap();
    assert_ne!(as_unit(&in_left), as_unit(&in_right));
}
