//! Ready-made instruments
//!
//! Both are assembled through [`Simulator::add_component`], the same way an
//! instrument file is.

use crate::error::SimError;
use crate::params::ComponentParams;
use crate::simulator::Simulator;

/// Names accepted by [`by_name`]
pub const NAMES: [&str; 2] = ["guide", "large"];

/// Tilt of the first periscope mirror about y, degrees
pub const PERISCOPE_MIRROR_ANGLE: f64 = 30.0;

/// Source, 4 m guide and a monitor 0.8 m past the guide exit
pub fn guide() -> Result<Simulator, SimError> {
    let mut sim = Simulator::new();

    sim.add_component(
        "Source",
        ComponentParams::new().name("source").width(0.1).height(0.1).spread(3.0),
        None,
    )?;

    let length = 4.0;
    let guide = sim.add_component(
        "Guide",
        ComponentParams::new()
            .name("guide")
            .width(0.07)
            .height(0.07)
            .length(length)
            .position([0.0, 0.0, 0.25]),
        None,
    )?;

    sim.add_component(
        "Monitor",
        ComponentParams::new()
            .name("monitor")
            .bins(20, 20)
            .width(0.08)
            .height(0.08)
            .position([0.0, 0.0, length + 0.8]),
        Some(guide),
    )?;

    Ok(sim)
}

/// Two-mirror periscope behind a 2 m guide.
///
/// The first mirror turns the beam by twice its tilt, the second turns it
/// back, so the monitor sees a beam travelling along +z again.
pub fn periscope() -> Result<Simulator, SimError> {
    let mut sim = Simulator::new();

    sim.add_component(
        "Source",
        ComponentParams::new().name("source").width(0.1).height(0.1).spread(3.0),
        None,
    )?;

    let length = 2.0;
    let guide = sim.add_component(
        "Guide",
        ComponentParams::new()
            .name("guide")
            .width(0.07)
            .height(0.07)
            .length(length)
            .position([0.0, 0.0, 0.25]),
        None,
    )?;

    let angle = PERISCOPE_MIRROR_ANGLE;
    let mirror1 = sim.add_component(
        "Mirror",
        ComponentParams::new()
            .name("mirror1")
            .width(0.04)
            .height(0.06)
            .position([0.0, 0.0, length + 0.25])
            .rotation([0.0, angle, 0.0]),
        Some(guide),
    )?;

    let arm1 = sim.add_component(
        "Arm",
        ComponentParams::new().name("arm1").rotation([0.0, angle, 0.0]),
        Some(mirror1),
    )?;

    let mirror2 = sim.add_component(
        "Mirror",
        ComponentParams::new()
            .name("mirror2")
            .width(0.04)
            .height(0.06)
            .position([0.0, 0.0, 0.25])
            .rotation([0.0, 180.0 - angle, 0.0]),
        Some(arm1),
    )?;

    let arm2 = sim.add_component(
        "Arm",
        ComponentParams::new().name("arm2").rotation([0.0, 180.0 - angle, 0.0]),
        Some(mirror2),
    )?;

    sim.add_component(
        "Monitor",
        ComponentParams::new()
            .name("monitor")
            .bins(20, 20)
            .width(0.05)
            .height(0.05)
            .position([0.0, 0.0, 1.0]),
        Some(arm2),
    )?;

    Ok(sim)
}

/// Look up a built-in instrument; `None` for unknown names
pub fn by_name(name: &str) -> Option<Result<Simulator, SimError>> {
    match name {
        "guide" => Some(guide()),
        "large" | "periscope" => Some(periscope()),
        _ => None,
    }
}
