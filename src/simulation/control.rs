//! Disease control measures: movement bans, restriction zones, and
//! active surveillance
//!
//! Movement bans fire from inside the detection path the moment a farm
//! is detected. Zones and the one-shot active surveillance sweep run in
//! the control phase at the start of the first day after the outbreak
//! has been observed.

use crate::core::config::ControlParams;
use crate::world::SimulationState;

/// Radius of the one-shot active surveillance sweep around the first
/// detected farm (metres)
const ACTIVE_SURVEILLANCE_RADIUS: f64 = 15_000.0;

/// Start-of-day control step.
///
/// Once BTV has been observed, classifies the country into restriction
/// zones around the first detected farm (if enabled) and performs the
/// one-shot active surveillance sweep. Does nothing under `no_control`.
pub fn apply_control_measures(state: &mut SimulationState, ctrl: &ControlParams) {
    if ctrl.no_control {
        return;
    }

    if state.btv_observed && !state.restriction_zones_implemented {
        let centre = state
            .first_detected_farm_id
            .expect("outbreak observed without a first detected farm");
        if ctrl.restriction_zones {
            setup_restriction_zones(state, centre, ctrl);
        }
        if !state.active_surveillance_performed {
            perform_active_surveillance(state, centre);
        }
    }
}

/// Ban movement on every farm within the ban radius of a newly detected
/// farm, plus county-wide or national bans when those policies are on.
///
/// The local farm list is built once, on the centre farm's first
/// detection, and cached on the farm for later re-detections.
pub(crate) fn implement_local_movement_ban(
    state: &mut SimulationState,
    centre: usize,
    ctrl: &ControlParams,
) {
    if !state.farms[centre].ever_been_detected {
        let centre_pos = state.farms[centre].position;
        let ban_radius_sq = ctrl.ban_radius * ctrl.ban_radius;
        let local: Vec<usize> = state
            .farms
            .iter()
            .enumerate()
            .filter(|(k, farm)| {
                *k != centre && farm.position.distance_sq(&centre_pos) < ban_radius_sq
            })
            .map(|(k, _)| k)
            .collect();
        state.farms[centre].local_farm_ids = local;
        state.farms[centre].ever_been_detected = true;
    }

    if !ctrl.no_farm_ban {
        let local = state.farms[centre].local_farm_ids.clone();
        for k in local {
            state.farms[k].movement_banned = true;
            state.farms[k].free_area = false;
        }
    }

    if ctrl.county_ban {
        let county = state.farms[centre].county_number;
        for farm in &mut state.farms {
            if farm.county_number == county {
                farm.movement_banned = true;
                farm.free_area = false;
            }
        }
    }

    if ctrl.total_ban {
        for farm in &mut state.farms {
            farm.movement_banned = true;
            farm.free_area = false;
        }
    }
}

/// Classify every farm into protection / surveillance zones by distance
/// to the first detected farm
fn setup_restriction_zones(state: &mut SimulationState, centre: usize, ctrl: &ControlParams) {
    let centre_pos = state.farms[centre].position;
    let pz_sq = ctrl.pz_radius * ctrl.pz_radius;
    let sz_sq = ctrl.sz_radius * ctrl.sz_radius;

    for farm in &mut state.farms {
        let dist_sq = farm.position.distance_sq(&centre_pos);
        if dist_sq <= pz_sq {
            farm.protection_zone = true;
            farm.free_area = false;
        } else if dist_sq <= sz_sq {
            farm.surveillance_zone = true;
            farm.free_area = false;
        }
    }
    state.restriction_zones_implemented = true;
    log::debug!(
        "restriction zones implemented around farm {} (day {})",
        state.farms[centre].id,
        state.simulation_day
    );
}

/// Test every animal on every farm within the surveillance radius of the
/// first detected farm; infected holdings are marked detected.
fn perform_active_surveillance(state: &mut SimulationState, centre: usize) {
    let centre_pos = state.farms[centre].position;
    let radius_sq = ACTIVE_SURVEILLANCE_RADIUS * ACTIVE_SURVEILLANCE_RADIUS;

    for k in 0..state.farms.len() {
        if state.farms[k].position.distance_sq(&centre_pos) > radius_sq {
            continue;
        }
        state.num_farms_checked += 1;
        state.num_tests +=
            (state.farms[k].num_cattle() + state.farms[k].num_sheep()) as u64;
        let infected = state.farms[k].num_inf_cattle() + state.farms[k].num_inf_sheep();
        if infected > 0.0 {
            state.farms[k].detected = true;
            state.num_pos_tests +=
                (infected + state.farms[k].r_sheep + state.farms[k].r_cattle) as u64;
        }
    }
    state.active_surveillance_performed = true;
    log::debug!(
        "active surveillance swept {} farms (day {})",
        state.num_farms_checked,
        state.simulation_day
    );
}
