//==================================================
// File: tests/scheduling.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Delay scheduling regression tests
// Objective: Drive schedule/cancel/fire through a bridge on the simulated clock
//==================================================

use s4pd::{Bridge, BridgeConfig, HostEvent, SimHost, Value};

fn bridge() -> (Bridge<SimHost>, SimHost) {
    let host = SimHost::new();
    let bridge = Bridge::new(host.clone(), BridgeConfig::default()).expect("bridge");
    (bridge, host)
}

fn fired(host: &SimHost) -> Vec<String> {
    host.events()
        .iter()
        .filter_map(|event| match event {
            HostEvent::Post(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

//==================================================
// Section 1.0 - Scenarios
//==================================================

#[test]
fn cancelling_the_later_delay_leaves_only_the_earlier() {
    let (mut bridge, host) = bridge();
    bridge
        .eval_quiet(
            "(define a (schedule-delay! 10 (lambda () (post \"A\" (length '(1))))))
             (define b (schedule-delay! 50 (lambda () (post \"B\"))))",
        )
        .expect("schedule");
    assert_eq!(bridge.pending_delays(), 2);

    assert_eq!(bridge.advance(5.0), 0);
    assert_eq!(bridge.eval_quiet("(cancel-delay! b)").expect("cancel"), Value::Boolean(true));
    assert_eq!(bridge.pending_delays(), 1);

    assert_eq!(bridge.advance(4.0), 0);
    assert_eq!(bridge.advance(1.0), 1);
    assert_eq!(host.now(), 10.0);
    assert_eq!(fired(&host), vec!["A 1"]);

    assert_eq!(bridge.advance(100.0), 0);
    assert_eq!(fired(&host), vec!["A 1"]);
    assert_eq!(bridge.pending_delays(), 0);
    assert!(bridge.registry().is_empty());
    assert_eq!(host.pending_timers(), 0);
}

#[test]
fn shorter_delays_fire_first_regardless_of_schedule_order() {
    let (mut bridge, host) = bridge();
    bridge
        .eval_quiet(
            "(schedule-delay! 30 (lambda () (post \"third\")))
             (schedule-delay! 10 (lambda () (post \"first\")))
             (schedule-delay! 20 (lambda () (post \"second\")))
             (schedule-delay! 20 (lambda () (post \"second-again\")))",
        )
        .expect("schedule");
    assert_eq!(bridge.advance(30.0), 4);
    assert_eq!(fired(&host), vec!["first", "second", "second-again", "third"]);
}

#[test]
fn nested_delays_are_measured_from_the_firing_time() {
    let (mut bridge, host) = bridge();
    bridge
        .eval_quiet(
            "(schedule-delay! 10 (lambda ()
               (schedule-delay! 10 (lambda () (post \"inner\")))
               (post \"outer\")))",
        )
        .expect("schedule");
    assert_eq!(bridge.advance(15.0), 1);
    assert_eq!(fired(&host), vec!["outer"]);
    assert_eq!(bridge.advance(5.0), 1);
    assert_eq!(fired(&host), vec!["outer", "inner"]);
}

//==================================================
// Section 2.0 - Cancellation
//==================================================

#[test]
fn cancel_is_idempotent_and_tolerates_unknown_handles() {
    let (mut bridge, _host) = bridge();
    let value = bridge
        .eval_quiet(
            "(define h (schedule-delay! 10 'nothing))
             (list (cancel-delay! h) (cancel-delay! h) (cancel-delay! 'delay:99:0)
                   (cancel-delay! 'bogus) (cancel-delay! 3))",
        )
        .expect("cancel");
    assert_eq!(value.to_string(), "(#t #f #f #f #f)");
}

#[test]
fn cancelling_after_firing_returns_false() {
    let (mut bridge, _host) = bridge();
    bridge
        .eval_quiet("(define h (schedule-delay! 1 (lambda () 'done)))")
        .expect("schedule");
    bridge.advance(1.0);
    assert_eq!(bridge.eval_quiet("(cancel-delay! h)").expect("cancel"), Value::Boolean(false));
}

#[test]
fn cancel_all_empties_the_registry_after_any_interleaving() {
    let (mut bridge, host) = bridge();
    let value = bridge
        .eval_quiet(
            "(define hs (map (lambda (ms) (schedule-delay! ms (lambda () (post \"fired\"))))
                             '(5 1 9 3 7 2)))
             (cancel-delay! (list-ref hs 1))
             (cancel-delay! (list-ref hs 4))
             (schedule-delay! 4 \"(post \\\"late\\\")\")
             (cancel-all!)",
        )
        .expect("cancel-all");
    assert_eq!(value, Value::Integer(5));
    assert_eq!(bridge.pending_delays(), 0);
    assert!(bridge.registry().links_consistent());
    assert_eq!(bridge.advance(100.0), 0);
    assert!(fired(&host).is_empty());
}

#[test]
fn invalid_delays_are_catchable() {
    let (mut bridge, _host) = bridge();
    let value = bridge
        .eval_quiet(
            "(catch 'invalid-delay (lambda () (schedule-delay! -5 'x)) \
             (lambda (tag msg) tag))",
        )
        .expect("caught");
    assert_eq!(value, Value::symbol("invalid-delay"));
    assert!(bridge.registry().is_empty());
}

#[test]
fn teardown_cancels_every_pending_delay() {
    let host = SimHost::new();
    let owner = {
        let mut bridge = Bridge::new(host.clone(), BridgeConfig::default()).expect("bridge");
        bridge
            .eval_quiet("(schedule-delay! 10 'a) (schedule-delay! 20 'b) (schedule-delay! 30 'c)")
            .expect("schedule");
        assert_eq!(host.pending_timers(), 3);
        bridge.owner()
    };
    assert_eq!(host.pending_timers(), 0);
    assert_eq!(host.pop_due(owner, f64::MAX), None);
}

#[test]
fn two_bridges_keep_separate_delays() {
    let host = SimHost::new();
    let mut first = Bridge::new(host.clone(), BridgeConfig::default()).expect("first");
    let mut second = Bridge::new(host.clone(), BridgeConfig::default()).expect("second");
    first.eval_quiet("(schedule-delay! 10 'a)").expect("a");
    second.eval_quiet("(schedule-delay! 10 'b)").expect("b");
    assert_ne!(first.owner(), second.owner());
    assert_eq!(first.cancel_all(), 1);
    assert_eq!(second.pending_delays(), 1);
    assert_eq!(host.pending_timers(), 1);
}

#[test]
fn two_bridges_each_fire_only_their_own_delays() {
    let host = SimHost::new();
    let mut first = Bridge::new(host.clone(), BridgeConfig::default()).expect("first");
    let mut second = Bridge::new(host.clone(), BridgeConfig::default()).expect("second");
    first
        .eval_quiet("(schedule-delay! 10 (lambda () (post \"A\")))")
        .expect("a");
    second
        .eval_quiet("(schedule-delay! 5 (lambda () (post \"B\")))")
        .expect("b");

    assert_eq!(first.advance(6.0), 0);
    assert!(fired(&host).is_empty());
    assert_eq!(first.pending_delays(), 1);
    assert_eq!(second.pending_delays(), 1);
    assert_eq!(host.pending_timers(), 2);

    assert_eq!(second.advance(0.0), 1);
    assert_eq!(fired(&host), vec!["B"]);
    assert_eq!(first.advance(4.0), 1);
    assert_eq!(host.now(), 10.0);
    assert_eq!(fired(&host), vec!["B", "A"]);
    assert_eq!(first.pending_delays(), 0);
    assert_eq!(second.pending_delays(), 0);
    assert_eq!(host.pending_timers(), 0);
}

//==================================================
// End of file
//==================================================
