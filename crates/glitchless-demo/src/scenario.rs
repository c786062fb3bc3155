//! Graph wiring for each demo scenario.
//!
//! Every scenario attaches a single terminal observer to its final node and
//! records which send (`round`, with `0` for the initial delivery) produced
//! each notification.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glitchless_runtime::{
    Observable, PropagationStats, Token, combine, propagation_stats, reset_propagation_stats,
};
use serde::Serialize;
use tracing::{debug, info_span};

use crate::cli::{DiamondArgs, NetworkArgs, SumArgs};

/// One value delivered to the scenario's observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification<T> {
    pub round: usize,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport<T> {
    pub scenario: &'static str,
    pub sends: usize,
    pub notifications: Vec<Notification<T>>,
    pub stats: PropagationStats,
}

impl<T> ScenarioReport<T> {
    /// Notifications for one round, in delivery order.
    pub fn round(&self, round: usize) -> impl Iterator<Item = &T> {
        self.notifications
            .iter()
            .filter(move |n| n.round == round)
            .map(|n| &n.value)
    }
}

struct Recorder<T> {
    round: Rc<Cell<usize>>,
    notifications: Rc<RefCell<Vec<Notification<T>>>>,
    sends: usize,
    _token: Token,
}

impl<T: Clone + 'static> Recorder<T> {
    fn attach(node: &Observable<T>) -> Self {
        reset_propagation_stats();
        let round = Rc::new(Cell::new(0));
        let notifications = Rc::new(RefCell::new(Vec::new()));
        let token = {
            let round = Rc::clone(&round);
            let notifications = Rc::clone(&notifications);
            node.observe(move |value: &T| {
                notifications.borrow_mut().push(Notification {
                    round: round.get(),
                    value: value.clone(),
                });
            })
        };
        Self {
            round,
            notifications,
            sends: 0,
            _token: token,
        }
    }

    fn next_round(&mut self) -> usize {
        self.sends += 1;
        self.round.set(self.sends);
        self.sends
    }

    fn finish(self, scenario: &'static str) -> ScenarioReport<T> {
        let notifications = self.notifications.borrow().clone();
        ScenarioReport {
            scenario,
            sends: self.sends,
            notifications,
            stats: propagation_stats(),
        }
    }
}

/// airplaneMode, wifi and cellular toggles.
///
/// `wifiAndCellular` is true when airplane mode is off and both radios are
/// on. Every airplane mode change reaches it along four paths, and it is
/// notified once per send.
pub fn network(args: &NetworkArgs) -> ScenarioReport<bool> {
    let _span = info_span!("scenario", name = "network").entered();

    let airplane_mode = Observable::labeled(args.airplane_mode, "airplaneMode");
    let cellular = Observable::labeled(args.cellular, "cellular");
    let wifi = Observable::labeled(args.wifi, "wifi");

    let not_airplane_mode = airplane_mode.map(|on| !on);
    not_airplane_mode.set_debug_label("notAirplaneMode");

    let cellular_enabled = &not_airplane_mode & &cellular;
    cellular_enabled.set_debug_label("cellularEnabled");
    let wifi_enabled = &not_airplane_mode & &wifi;
    wifi_enabled.set_debug_label("wifiEnabled");
    let wifi_and_cellular = &wifi_enabled & &cellular_enabled;
    wifi_and_cellular.set_debug_label("wifiAndCellular");

    let mut recorder = Recorder::attach(&wifi_and_cellular);
    for &on in &args.toggles {
        let round = recorder.next_round();
        debug!(message = "scenario.send", round, node = %airplane_mode.debug_label(), value = on);
        airplane_mode.send(on);
    }
    recorder.finish("network")
}

/// `sum = x.flat_map(|v| x.map(|w| v + w))`.
///
/// Both sides of the sum read the same root, so a send of `n` is seen as
/// `2 * n` and never as the old value plus the new one.
pub fn sum(args: &SumArgs) -> ScenarioReport<i64> {
    let _span = info_span!("scenario", name = "sum").entered();

    let x = Observable::labeled(args.initial, "x");
    let sum = {
        let x_inner = x.clone();
        x.flat_map(move |&v| x_inner.map(move |&w| v.wrapping_add(w)))
    };
    sum.set_debug_label("sum");

    let mut recorder = Recorder::attach(&sum);
    for &value in &args.sends {
        let round = recorder.next_round();
        debug!(message = "scenario.send", round, node = %x.debug_label(), value);
        x.send(value);
    }
    recorder.finish("sum")
}

/// Two maps of one root joined with [`combine`].
///
/// The observer sees `(v + 1, v * 10)` for the same `v` on every round.
pub fn diamond(args: &DiamondArgs) -> ScenarioReport<(i64, i64)> {
    let _span = info_span!("scenario", name = "diamond").entered();

    let root = Observable::labeled(args.initial, "root");
    let incremented = root.map(|v| v.wrapping_add(1));
    incremented.set_debug_label("incremented");
    let scaled = root.map(|v| v.wrapping_mul(10));
    scaled.set_debug_label("scaled");
    let pair = combine(&incremented, &scaled, |a, b| (*a, *b));
    pair.set_debug_label("pair");

    let mut recorder = Recorder::attach(&pair);
    for &value in &args.sends {
        let round = recorder.next_round();
        debug!(message = "scenario.send", round, node = %root.debug_label(), value);
        root.send(value);
    }
    recorder.finish("diamond")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;

    fn network_args(toggles: Vec<bool>) -> NetworkArgs {
        NetworkArgs {
            airplane_mode: false,
            wifi: true,
            cellular: true,
            toggles,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn network_notifies_once_per_toggle() {
        let report = network(&network_args(vec![true, false]));
        let values: Vec<_> = report.notifications.iter().map(|n| n.value).collect();
        assert_eq!(values, vec![true, false, true]);
        let rounds: Vec<_> = report.notifications.iter().map(|n| n.round).collect();
        assert_eq!(rounds, vec![0, 1, 2]);
        assert_eq!(report.sends, 2);
        assert_eq!(report.stats.rounds, 2);
    }

    #[test]
    fn network_with_wifi_off_stays_false() {
        let mut args = network_args(vec![true, false]);
        args.wifi = false;
        let report = network(&args);
        assert!(report.notifications.iter().all(|n| !n.value));
        assert_eq!(report.notifications.len(), 3);
    }

    #[test]
    fn sum_doubles_every_send() {
        let report = sum(&SumArgs {
            initial: 1,
            sends: vec![2, -7],
            format: OutputFormat::Text,
        });
        let values: Vec<_> = report.notifications.iter().map(|n| n.value).collect();
        assert_eq!(values, vec![2, 4, -14]);
    }

    #[test]
    fn diamond_pairs_come_from_one_root_value() {
        let report = diamond(&DiamondArgs {
            initial: 0,
            sends: vec![1, 2, 3],
            format: OutputFormat::Text,
        });
        assert_eq!(report.round(0).copied().collect::<Vec<_>>(), vec![(1, 0)]);
        for round in 1..=3 {
            let pairs: Vec<_> = report.round(round).copied().collect();
            let v = i64::try_from(round).unwrap_or_default();
            assert_eq!(pairs, vec![(v + 1, v * 10)], "round {round}");
        }
    }

    #[test]
    fn no_sends_only_reports_initial_delivery() {
        let report = sum(&SumArgs {
            initial: 5,
            sends: Vec::new(),
            format: OutputFormat::Text,
        });
        assert_eq!(report.notifications, vec![Notification { round: 0, value: 10 }]);
        assert_eq!(report.stats.rounds, 0);
    }
}
