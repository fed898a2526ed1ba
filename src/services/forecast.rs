use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::domain::delay::Delay;
use crate::domain::inputs::ForecastInputs;
use crate::domain::phase::Phase;
use crate::services::forecast_types::{ForecastMonth, ForecastResult, Verdict};

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("no phases provided")]
    EmptyPhases,
    #[error("phase {0} has a non-positive length")]
    NonPositivePhaseLength(String),
    #[error("contract value must be nonzero")]
    ZeroContractValue,
    #[error("forecast produced a non-finite result")]
    NonFiniteResult,
}

impl ForecastError {
    /// Whether the error describes semantically impossible input, as
    /// opposed to an arithmetic fault during the computation itself.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, ForecastError::NonFiniteResult)
    }
}

/// Payback period reported when cumulative net cash never turns positive
/// within the simulated horizon.
pub const PAYBACK_NEVER: u32 = 999;

#[derive(Debug, Clone)]
struct ActivePhase {
    index: usize,
    name: String,
    remaining: i64,
    expense: f64,
    overhead: f64,
    upfront: f64,
}

impl ActivePhase {
    fn enter(index: usize, phase: &Phase) -> Self {
        Self {
            index,
            name: phase.name.clone(),
            remaining: phase.length - 1,
            expense: phase.expense,
            overhead: phase.overhead,
            upfront: phase.upfront,
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveDelay {
    expense: f64,
    remaining: i64,
}

/// Phase and delay cursor for one simulated month, threaded through the
/// loop. Each month produces the next state from the previous one; the
/// engine keeps no state between `simulate` calls.
#[derive(Debug, Clone)]
struct SimulationState {
    delay: Option<ActiveDelay>,
    cumulative_delay_months: u32,
    /// `None` once every phase has completed; the project then contributes
    /// no further phase cost while the horizon keeps running.
    phase: Option<ActivePhase>,
    phase_change: bool,
}

impl SimulationState {
    fn opening(first_phase: &Phase) -> Self {
        Self {
            delay: None,
            cumulative_delay_months: 0,
            phase: Some(ActivePhase::enter(0, first_phase)),
            phase_change: false,
        }
    }
}

/// Runs the month-by-month cash flow simulation over
/// `time_frame + payment_lag + total delay months` and aggregates the
/// liquidity and profitability metrics.
///
/// Pure function of its input: no I/O, and identical inputs produce
/// identical output.
///
/// # Errors
/// - `EmptyPhases` when no phase anchors the simulation.
/// - `NonPositivePhaseLength` when any phase could never terminate.
/// - `ZeroContractValue` when the gross margin would divide by zero.
/// - `NonFiniteResult` when the aggregates overflow to a non-finite value.
pub fn simulate(inputs: &ForecastInputs) -> Result<ForecastResult, ForecastError> {
    let first_phase = inputs.phases.first().ok_or(ForecastError::EmptyPhases)?;
    if let Some(phase) = inputs.phases.iter().find(|phase| phase.length < 1) {
        return Err(ForecastError::NonPositivePhaseLength(phase.name.clone()));
    }
    if inputs.contract_value == 0.0 {
        return Err(ForecastError::ZeroContractValue);
    }

    let total_delay_months: u32 = inputs.delays.values().map(|delay| delay.length).sum();
    let horizon = inputs.time_frame + inputs.payment_lag + total_delay_months;

    let mut state = SimulationState::opening(first_phase);
    let mut forecast = Vec::with_capacity(horizon as usize);
    let mut cumulative_net_cash = 0.0;
    let mut cumulative_expenses = 0.0;
    let mut cumulative_cash_out = 0.0;
    let mut min_net_cash = 0.0;
    let mut min_net_cash_month = 0;
    let mut verdict = Verdict::Go;
    let mut payback_period = PAYBACK_NEVER;
    let mut payback_found = false;

    for month in 1..=horizon {
        state = advance_delay(state, month, &inputs.delays);
        state = advance_phase(state, &inputs.phases);

        let unexpected = unexpected_cost(&state, &inputs.unexpected_costs);
        let cash_in = cash_in_for_month(&state, month, inputs);
        let (base_cash_out, accrued_expense) =
            cash_out_for_month(&state, unexpected, inputs.contingency_percent);
        cumulative_expenses += accrued_expense;
        // The profitability check accumulates cash out before upfront
        // charges; the emitted month includes them.
        cumulative_cash_out += base_cash_out;

        // Upfront is charged on every phase entry (month 1 included) and is
        // excluded from the margin expense base, like overhead.
        let upfront = if state.phase_change || month == 1 {
            state.phase.as_ref().map_or(0.0, |phase| phase.upfront)
        } else {
            0.0
        };
        cumulative_expenses -= upfront;

        let net_cash = cash_in - base_cash_out - upfront;
        cumulative_net_cash += net_cash;

        forecast.push(ForecastMonth {
            cash_in,
            cash_out: base_cash_out + upfront,
            net_cash,
            cumulative_net_cash,
            phase: state.phase.as_ref().map(|phase| phase.name.clone()),
        });

        if month == 1 {
            min_net_cash = cumulative_net_cash;
        } else if cumulative_net_cash < min_net_cash {
            min_net_cash = cumulative_net_cash;
            min_net_cash_month = month;
        }
        if cumulative_net_cash < inputs.min_cash_allowed {
            verdict = Verdict::Restructure;
        }
        if cumulative_net_cash > 0.0 && !payback_found {
            payback_period = month;
            payback_found = true;
        }
    }

    // Profitability dominates the liquidity check: paying out more than the
    // contract is worth overrides an interim Go or Restructure.
    if inputs.contract_value < cumulative_cash_out {
        verdict = Verdict::NotProfitable;
    }
    let gross_margin = (inputs.contract_value - cumulative_expenses) / inputs.contract_value;
    if !gross_margin.is_finite() || !cumulative_net_cash.is_finite() {
        return Err(ForecastError::NonFiniteResult);
    }

    Ok(ForecastResult {
        forecast,
        verdict,
        payback_period,
        gross_margin,
        min_net_cash,
        min_net_cash_month,
        cumulative_net_cash,
    })
}

fn advance_delay(
    mut state: SimulationState,
    month: u32,
    delays: &BTreeMap<u32, Delay>,
) -> SimulationState {
    if let Some(delay) = delays.get(&month) {
        // A delay starting while another is active supersedes it.
        state.cumulative_delay_months += delay.length;
        state.delay = Some(ActiveDelay {
            expense: delay.expense,
            remaining: i64::from(delay.length) - 1,
        });
    } else {
        match state.delay.as_mut() {
            Some(active) if active.remaining > 0 => active.remaining -= 1,
            _ => state.delay = None,
        }
    }
    state
}

fn advance_phase(mut state: SimulationState, phases: &[Phase]) -> SimulationState {
    match state.phase.take() {
        None => {
            state.phase_change = false;
        }
        Some(mut current) if current.remaining >= 0 => {
            // The countdown is frozen while a delay is active; the phase
            // itself stays current.
            if state.delay.is_none() {
                current.remaining -= 1;
            }
            state.phase_change = false;
            state.phase = Some(current);
        }
        Some(current) => {
            // The transition itself happens even during a delay; only the
            // incoming phase's countdown is frozen.
            let next_index = current.index + 1;
            state.phase = phases
                .get(next_index)
                .map(|phase| ActivePhase::enter(next_index, phase));
            state.phase_change = true;
        }
    }
    state
}

fn unexpected_cost(state: &SimulationState, unexpected_costs: &HashMap<String, f64>) -> f64 {
    let Some(phase) = state.phase.as_ref() else {
        return 0.0;
    };
    unexpected_costs
        .get(&phase.name)
        .map_or(0.0, |percent| phase.expense * percent)
}

/// Billing does not progress during a delay; otherwise the milestone for
/// `month - payment_lag - cumulative delay` releases its fraction of the
/// contract value. Unmapped months yield zero.
fn cash_in_for_month(state: &SimulationState, month: u32, inputs: &ForecastInputs) -> f64 {
    if state.delay.is_some() {
        return 0.0;
    }
    let offset = inputs.payment_lag + state.cumulative_delay_months;
    if month < offset {
        return 0.0;
    }
    let key = i64::from(month - offset);
    let fraction = inputs.billing_milestones.get(&key).copied().unwrap_or(0.0);
    fraction * inputs.contract_value
}

/// Returns the month's cash-out before upfront charges, and the portion
/// accrued into the expense base used for gross margin. Overhead is paid
/// but never accrued; during a delay only the delay's own expense accrues.
fn cash_out_for_month(
    state: &SimulationState,
    unexpected: f64,
    contingency_percent: f64,
) -> (f64, f64) {
    let overhead = state.phase.as_ref().map_or(0.0, |phase| phase.overhead);
    match state.delay.as_ref() {
        Some(active) => (active.expense + overhead, active.expense),
        None => {
            let expense = state.phase.as_ref().map_or(0.0, |phase| phase.expense);
            let contingency = contingency_percent * expense;
            (
                expense + overhead + contingency + unexpected,
                expense + contingency + unexpected,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_phase, milestones, single_phase_inputs};

    #[test]
    fn horizon_is_time_frame_plus_payment_lag_without_delays() {
        let mut inputs = single_phase_inputs(3, 1000.0, 5000.0);
        inputs.time_frame = 4;
        inputs.payment_lag = 2;

        let result = simulate(&inputs).unwrap();
        assert_eq!(result.forecast.len(), 6);
    }

    #[test]
    fn delays_extend_the_horizon() {
        let mut inputs = single_phase_inputs(3, 1000.0, 5000.0);
        inputs.delays.insert(2, Delay { length: 2, expense: 0.0 });

        let result = simulate(&inputs).unwrap();
        assert_eq!(result.forecast.len(), 5);
    }

    #[test]
    fn upfront_billing_recovers_immediately() {
        // One phase of 3 months at 1000/month, the whole contract billed in
        // month 1.
        let mut inputs = single_phase_inputs(3, 1000.0, 5000.0);
        inputs.billing_milestones = milestones(&[(1, 1.0)]);

        let result = simulate(&inputs).unwrap();
        let first = &result.forecast[0];
        assert_eq!(first.cash_in, 5000.0);
        assert_eq!(first.cash_out, 1000.0);
        assert_eq!(first.cumulative_net_cash, 4000.0);
        assert_eq!(result.verdict, Verdict::Go);
        assert_eq!(result.payback_period, 1);
        assert_eq!(result.gross_margin, (5000.0 - 3000.0) / 5000.0);
    }

    #[test]
    fn late_billing_breaches_the_cash_floor() {
        // Billing lands in month 3 and the floor is zero: months 1-2 run
        // negative, so the verdict turns Restructure and stays there.
        let mut inputs = single_phase_inputs(3, 1000.0, 5000.0);
        inputs.min_cash_allowed = 0.0;
        inputs.billing_milestones = milestones(&[(3, 1.0)]);

        let result = simulate(&inputs).unwrap();
        assert_eq!(result.forecast[0].cumulative_net_cash, -1000.0);
        assert_eq!(result.forecast[1].cumulative_net_cash, -2000.0);
        assert!(result.forecast[2].cumulative_net_cash > 0.0);
        assert_eq!(result.verdict, Verdict::Restructure);
        assert_eq!(result.payback_period, 3);
    }

    #[test]
    fn delay_freezes_phase_countdown_and_billing() {
        // A 2-month delay starting in month 2 overlaps a 3-month phase. The
        // phase countdown must not advance during months 2-3, so the phase
        // is still current through month 5.
        let mut inputs = single_phase_inputs(3, 1000.0, 5000.0);
        inputs.phases[0].overhead = 100.0;
        inputs.delays.insert(2, Delay { length: 2, expense: 500.0 });
        inputs.billing_milestones = milestones(&[(2, 1.0)]);

        let result = simulate(&inputs).unwrap();
        assert_eq!(result.forecast.len(), 5);

        // Delay months pay the delay expense plus the frozen phase's
        // overhead, and billing is suspended.
        assert_eq!(result.forecast[1].cash_out, 600.0);
        assert_eq!(result.forecast[2].cash_out, 600.0);
        assert_eq!(result.forecast[1].cash_in, 0.0);
        assert_eq!(result.forecast[2].cash_in, 0.0);

        // Phase expense resumes in month 4, and the milestone originally
        // due in month 2 lands shifted by the accumulated delay.
        assert_eq!(result.forecast[3].cash_out, 1100.0);
        assert_eq!(result.forecast[3].cash_in, 5000.0);
        for month in &result.forecast {
            assert_eq!(month.phase.as_deref(), Some("delivery"));
        }
    }

    #[test]
    fn overspending_the_contract_is_not_profitable() {
        // Cash out (3000) exceeds the contract value (2000); the early
        // payback must not rescue the verdict.
        let mut inputs = single_phase_inputs(3, 1000.0, 2000.0);
        inputs.billing_milestones = milestones(&[(1, 1.0)]);

        let result = simulate(&inputs).unwrap();
        assert_eq!(result.payback_period, 1);
        assert_eq!(result.verdict, Verdict::NotProfitable);
    }

    #[test]
    fn cumulative_net_cash_is_the_running_sum() {
        let mut inputs = single_phase_inputs(4, 900.0, 6000.0);
        inputs.payment_lag = 1;
        inputs.phases[0].overhead = 50.0;
        inputs.phases[0].upfront = 200.0;
        inputs.contingency_percent = 0.1;
        inputs.delays.insert(3, Delay { length: 1, expense: 400.0 });
        inputs.billing_milestones = milestones(&[(1, 0.4), (4, 0.6)]);

        let result = simulate(&inputs).unwrap();
        let mut running = 0.0;
        for month in &result.forecast {
            running += month.net_cash;
            assert_eq!(month.cumulative_net_cash, running);
        }
    }

    #[test]
    fn min_net_cash_is_the_prefix_minimum() {
        let mut inputs = single_phase_inputs(4, 900.0, 6000.0);
        inputs.payment_lag = 2;
        inputs.billing_milestones = milestones(&[(2, 1.0)]);

        let result = simulate(&inputs).unwrap();
        let minimum = result
            .forecast
            .iter()
            .map(|month| month.cumulative_net_cash)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(result.min_net_cash, minimum);
    }

    #[test]
    fn min_net_cash_month_stays_zero_when_month_one_is_the_trough() {
        let mut inputs = single_phase_inputs(2, 1000.0, 5000.0);
        inputs.billing_milestones = milestones(&[(2, 1.0)]);

        let result = simulate(&inputs).unwrap();
        assert_eq!(result.min_net_cash, -1000.0);
        assert_eq!(result.min_net_cash_month, 0);
    }

    #[test]
    fn payback_defaults_when_cash_never_recovers() {
        let inputs = single_phase_inputs(3, 1000.0, 5000.0);

        let result = simulate(&inputs).unwrap();
        assert_eq!(result.payback_period, PAYBACK_NEVER);
    }

    #[test]
    fn simulate_is_idempotent() {
        let mut inputs = single_phase_inputs(5, 800.0, 7000.0);
        inputs.delays.insert(2, Delay { length: 1, expense: 300.0 });
        inputs.billing_milestones = milestones(&[(1, 0.5), (5, 0.5)]);
        inputs.unexpected_costs.insert("delivery".to_string(), 0.2);

        let first = simulate(&inputs).unwrap();
        let second = simulate(&inputs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn phase_sequence_advances_in_order_and_charges_upfront() {
        let mut inputs = single_phase_inputs(2, 1000.0, 50000.0);
        inputs.time_frame = 6;
        inputs.phases = vec![
            build_phase("design", 2, 1000.0),
            Phase {
                name: "build".to_string(),
                length: 2,
                expense: 2000.0,
                overhead: 0.0,
                upfront: 700.0,
            },
        ];

        let result = simulate(&inputs).unwrap();
        // The opening phase consumes a countdown tick in month 1, so it
        // runs months 1-2; the successor enters in month 3 without a tick
        // and runs months 3-5.
        assert_eq!(result.forecast[1].phase.as_deref(), Some("design"));
        assert_eq!(result.forecast[2].phase.as_deref(), Some("build"));
        assert_eq!(result.forecast[5].phase, None);

        // The upfront cost lands exactly on the transition month and is
        // excluded from the margin expense base.
        assert_eq!(result.forecast[2].cash_out, 2700.0);
        assert_eq!(result.forecast[3].cash_out, 2000.0);
        let expected_expenses = 2.0 * 1000.0 + 3.0 * 2000.0 - 700.0;
        assert_eq!(result.gross_margin, (50000.0 - expected_expenses) / 50000.0);
    }

    #[test]
    fn exhausted_phases_stop_accruing_but_horizon_keeps_running() {
        let mut inputs = single_phase_inputs(2, 1000.0, 9000.0);
        inputs.time_frame = 6;
        inputs.billing_milestones = milestones(&[(6, 1.0)]);

        let result = simulate(&inputs).unwrap();
        // The phase is current for months 1-2, then the project is
        // complete but the horizon keeps running for the late milestone.
        assert_eq!(result.forecast[1].phase.as_deref(), Some("delivery"));
        assert_eq!(result.forecast[2].phase, None);
        assert_eq!(result.forecast[2].cash_out, 0.0);
        assert_eq!(result.forecast[5].cash_in, 9000.0);
        assert_eq!(result.verdict, Verdict::Go);
    }

    #[test]
    fn delay_at_phase_boundary_freezes_the_incoming_phase() {
        let mut inputs = single_phase_inputs(1, 1000.0, 50000.0);
        inputs.time_frame = 6;
        inputs.phases = vec![
            build_phase("design", 1, 1000.0),
            Phase {
                name: "build".to_string(),
                length: 2,
                expense: 2000.0,
                overhead: 100.0,
                upfront: 500.0,
            },
        ];
        inputs.delays.insert(2, Delay { length: 2, expense: 300.0 });

        let result = simulate(&inputs).unwrap();
        // Month 2: the transition to "build" still happens and its upfront
        // is charged, but the delay pays only its own expense plus the
        // phase overhead.
        assert_eq!(result.forecast[1].phase.as_deref(), Some("build"));
        assert_eq!(result.forecast[1].cash_out, 300.0 + 100.0 + 500.0);
        // The countdown was frozen during months 2-3, so "build" is still
        // mid-flight in month 5.
        assert_eq!(result.forecast[4].phase.as_deref(), Some("build"));
        assert_eq!(result.forecast[4].cash_out, 2100.0);
    }

    #[test]
    fn unexpected_cost_applies_only_to_the_matching_phase() {
        let mut inputs = single_phase_inputs(2, 1000.0, 50000.0);
        inputs.time_frame = 6;
        inputs.phases = vec![
            build_phase("design", 2, 1000.0),
            build_phase("build", 2, 2000.0),
        ];
        inputs.unexpected_costs.insert("build".to_string(), 0.25);

        let result = simulate(&inputs).unwrap();
        assert_eq!(result.forecast[0].cash_out, 1000.0);
        assert_eq!(result.forecast[3].cash_out, 2000.0 + 500.0);
    }

    #[test]
    fn milestone_lookup_shifts_by_payment_lag() {
        let mut inputs = single_phase_inputs(3, 1000.0, 5000.0);
        inputs.payment_lag = 2;
        inputs.billing_milestones = milestones(&[(1, 1.0)]);

        let result = simulate(&inputs).unwrap();
        assert_eq!(result.forecast[0].cash_in, 0.0);
        assert_eq!(result.forecast[1].cash_in, 0.0);
        assert_eq!(result.forecast[2].cash_in, 5000.0);
    }

    #[test]
    fn empty_phases_are_rejected() {
        let mut inputs = single_phase_inputs(3, 1000.0, 5000.0);
        inputs.phases.clear();

        let error = simulate(&inputs).unwrap_err();
        assert!(matches!(error, ForecastError::EmptyPhases));
        assert!(error.is_invalid_input());
    }

    #[test]
    fn non_positive_phase_length_is_rejected() {
        let mut inputs = single_phase_inputs(3, 1000.0, 5000.0);
        inputs.phases.push(build_phase("stalled", 0, 100.0));

        let error = simulate(&inputs).unwrap_err();
        assert!(matches!(
            error,
            ForecastError::NonPositivePhaseLength(ref name) if name == "stalled"
        ));
    }

    #[test]
    fn zero_contract_value_is_rejected() {
        let inputs = single_phase_inputs(3, 1000.0, 0.0);

        let error = simulate(&inputs).unwrap_err();
        assert!(matches!(error, ForecastError::ZeroContractValue));
    }
}
