//! Interface-hierarchy fallback: requests for a broad capability satisfied
//! by an implementation registered under a narrower one.

use std::sync::Arc;

use beanwire::{Boundary, Context, capability, injectable};

#[capability]
pub trait Speaker: Send + Sync {
    fn volume(&self) -> u8;
}

#[capability]
pub trait LoudSpeaker: Speaker + Send + Sync {}

#[injectable(capability = LoudSpeaker, singleton, priority = 1)]
#[derive(Default)]
pub struct Megaphone;

impl Speaker for Megaphone {
    fn volume(&self) -> u8 {
        11
    }
}

impl LoudSpeaker for Megaphone {}

#[capability]
pub trait Device: Send + Sync {
    fn kind(&self) -> &'static str;
}

#[capability]
pub trait AudioDevice: Device + Send + Sync {}

#[capability]
pub trait Amplifier: AudioDevice + Send + Sync {}

#[injectable(capability = Amplifier, singleton, priority = 1)]
#[derive(Default)]
pub struct TubeAmp;

impl Device for TubeAmp {
    fn kind(&self) -> &'static str {
        "tube amp"
    }
}

impl AudioDevice for TubeAmp {}
impl Amplifier for TubeAmp {}

fn as_unit<T: ?Sized>(arc: &Arc<T>) -> *const () {
    Arc::as_ptr(arc) as *const ()
}

#[test]
fn broad_request_finds_narrow_registration() {
    let context = Context::instance_of(Boundary("hierarchy_broad"));
    let speaker = context.get_bean::<dyn Speaker>().unwrap();
    assert_eq!(speaker.volume(), 11);
}

#[test]
fn broad_and_narrow_views_share_the_singleton() {
    let context = Context::instance_of(Boundary("hierarchy_shared"));
    let narrow = context.get_bean::<dyn LoudSpeaker>().unwrap();
    let broad = context.get_bean::<dyn Speaker>().unwrap();
    assert_eq!(as_unit(&narrow), as_unit(&broad));
}

#[test]
fn concrete_type_resolves_through_its_registration() {
    let context = Context::instance_of(Boundary("hierarchy_concrete"));
    let concrete = context.get_bean::<Megaphone>().unwrap();
    assert_eq!(concrete.volume(), 11);
    let narrow = context.get_bean::<dyn LoudSpeaker>().unwrap();
    assert_eq!(as_unit(&concrete), as_unit(&narrow));
}

#[test]
fn fallback_walks_transitive_super_capabilities() {
    let context = Context::instance_of(Boundary("hierarchy_transitive"));
    let device = context.get_bean::<dyn Device>().unwrap();
    assert_eq!(device.kind(), "tube amp");
    let mid = context.get_bean::<dyn AudioDevice>().unwrap();
    assert_eq!(as_unit(&device), as_unit(&mid));
}
