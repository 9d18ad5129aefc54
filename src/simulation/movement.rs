//! Livestock movement transmission between farms
//!
//! Walks the directed edge list in stored order. Each link fires with
//! its daily risk, may be interrupted by control measures, and otherwise
//! ships a negative-binomially sized consignment of one species,
//! carrying infected animals stage-for-stage to the destination.

use rand_chacha::ChaCha8Rng;

use crate::core::config::MovementParams;
use crate::core::types::HostSpecies;
use crate::random;
use crate::world::SimulationState;

/// Process every movement link for today
pub fn movement_transmission(
    state: &mut SimulationState,
    movement: &MovementParams,
    rng: &mut ChaCha8Rng,
) {
    for k in 0..state.movements.len() {
        let from = state.movements.from[k];
        let to = state.movements.to[k];
        let risk = state.movements.risk[k];
        transmission_via_movement(state, from, to, risk, movement, rng);
    }
}

/// Process a single movement link between two farms
fn transmission_via_movement(
    state: &mut SimulationState,
    from: usize,
    to: usize,
    risk: f64,
    movement: &MovementParams,
    rng: &mut ChaCha8Rng,
) {
    debug_assert_ne!(from, to, "self-loops are rejected at validation");

    // Does the movement occur today?
    if random::uniform(rng) > risk {
        return;
    }

    // Control-based interruption: bans at either end, or a source inside
    // a restriction zone shipping towards looser restrictions
    let interrupted = {
        let src = &state.farms[from];
        let dst = &state.farms[to];
        src.movement_banned
            || dst.movement_banned
            || (src.protection_zone && !dst.protection_zone)
            || (src.surveillance_zone && dst.free_area)
    };
    if interrupted {
        state.interrupted_movements += 1;
        if state.farms[from].is_infected() {
            state.num_risky_moves_blocked += 1;
        }
        return;
    }

    let total_sheep = state.farms[from].num_sheep();
    let total_cattle = state.farms[from].num_cattle();
    if total_sheep + total_cattle < 1.0 {
        return;
    }

    // One consignment of one species, split by herd composition
    let cattle_move = random::uniform(rng) > total_sheep / (total_sheep + total_cattle);
    let num_inf_moved = if cattle_move {
        move_shipment(
            state,
            from,
            to,
            HostSpecies::Cattle,
            total_cattle,
            movement.cattle_shipment_size_k,
            movement.cattle_shipment_size_p,
            rng,
        )
    } else {
        move_shipment(
            state,
            from,
            to,
            HostSpecies::Sheep,
            total_sheep,
            movement.sheep_shipment_size_k,
            movement.sheep_shipment_size_p,
            rng,
        )
    };

    if num_inf_moved > 0 {
        state.num_movement_transmissions += 1;
        let dst = &mut state.farms[to];
        if !dst.ever_been_infected {
            dst.ever_been_infected = true;
            dst.first_infected_due_to_movement = true;
        }
    }
}

/// Ship one consignment and return how many infected animals moved.
///
/// Each animal in the consignment is infected with the source's current
/// infected fraction; an infected animal's Erlang stage is picked by
/// proportional sampling and transferred stage-for-stage.
#[allow(clippy::too_many_arguments)]
fn move_shipment(
    state: &mut SimulationState,
    from: usize,
    to: usize,
    species: HostSpecies,
    total: f64,
    shipment_k: f64,
    shipment_p: f64,
    rng: &mut ChaCha8Rng,
) -> u32 {
    let size = (1 + random::neg_binomial(rng, shipment_k, shipment_p) as usize)
        .min(total as usize);

    let (src_stages, dst_stages) = stage_chains(state, from, to, species);
    let mut infected: f64 = src_stages.iter().sum();
    let mut num_moved = 0;

    for _ in 0..size {
        if random::uniform(rng) < infected / total {
            // Proportional stage pick over the remaining infected
            let sel = random::uniform(rng) * infected;
            let mut cumulative = 0.0;
            for stage in 0..src_stages.len() {
                cumulative += src_stages[stage];
                if cumulative >= sel {
                    src_stages[stage] -= 1.0;
                    dst_stages[stage] += 1.0;
                    infected -= 1.0;
                    num_moved += 1;
                    break;
                }
            }
        }
    }
    num_moved
}

/// Mutable views of the source and destination Erlang chains for one species
fn stage_chains(
    state: &mut SimulationState,
    from: usize,
    to: usize,
    species: HostSpecies,
) -> (&mut Vec<f64>, &mut Vec<f64>) {
    let (src, dst) = if from < to {
        let (head, tail) = state.farms.split_at_mut(to);
        (&mut head[from], &mut tail[0])
    } else {
        let (head, tail) = state.farms.split_at_mut(from);
        (&mut tail[0], &mut head[to])
    };
    match species {
        HostSpecies::Sheep => (&mut src.i_sheep, &mut dst.i_sheep),
        HostSpecies::Cattle => (&mut src.i_cattle, &mut dst.i_cattle),
    }
}
