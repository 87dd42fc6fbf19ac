//! Integration tests for the injector and dispatcher.
//!
//! The injector is driven exactly as the worker drives it, against the
//! recording mock devices, and the emitted kernel-event stream is asserted
//! in order. Covers the pressed-set invariants, the throttle and
//! reseed-counter interplay of `DMMV`, Lock/modifier synchronisation, wheel
//! quantisation, and the dispatcher's FIFO ordering guarantee.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use flowlink_client::application::device::LockKey;
use flowlink_client::application::{
    dispatch_channel, CursorContext, InjectorSettings, InputInjector, ReplySink, SessionState,
    StateHandle, Worker,
};
use flowlink_client::infrastructure::input::{
    event_log, EventLog, MockKeyboard, MockMouse, MockScreenProbe, RecordedEvent,
};
use flowlink_core::keymap::evdev::ecodes;
use flowlink_core::protocol::messages::{modifier, EnterMsg, KeyDownMsg, KeyUpMsg};
use flowlink_core::Message;

/// Lock LED handle type from the mock keyboard.
type Leds = Arc<Mutex<std::collections::HashMap<LockKey, bool>>>;

/// Builds an injector over recording mocks with a 1920x1080 probe.
/// The throttle is disabled unless a test opts in.
fn make_injector(settings: InjectorSettings) -> (InputInjector, EventLog, StateHandle, Leds) {
    let log = event_log();
    let mouse = MockMouse::new(Arc::clone(&log));
    let keyboard = MockKeyboard::new(Arc::clone(&log));
    let leds = keyboard.leds();
    let state = StateHandle::new();
    state.set(SessionState::Connected);

    let cursor = CursorContext::new(Box::new(MockScreenProbe::sized(1920, 1080)), None);
    let injector = InputInjector::new(
        Box::new(mouse),
        Box::new(keyboard),
        cursor,
        state.clone(),
        settings,
    );
    (injector, log, state, leds)
}

fn no_throttle() -> InjectorSettings {
    InjectorSettings {
        move_threshold: Duration::ZERO,
        ..InjectorSettings::default()
    }
}

fn enter_at(injector: &mut InputInjector, x: i16, y: i16) {
    injector.enter(&EnterMsg {
        entry_x: x,
        entry_y: y,
        sequence: 1,
        mod_mask: 0,
    });
}

/// Only the kernel-visible input events, without the SYN markers.
fn events_of(log: &EventLog) -> Vec<RecordedEvent> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|e| {
            !matches!(
                e,
                RecordedEvent::MouseSyn
                    | RecordedEvent::KeyboardSyn
                    | RecordedEvent::MouseClosed
                    | RecordedEvent::KeyboardClosed
            )
        })
        .cloned()
        .collect()
}

// ── Pressed-set invariants ────────────────────────────────────────────────────

#[test]
fn test_leave_drains_pressed_keys_and_buttons() {
    let (mut injector, log, state, _) = make_injector(no_throttle());
    enter_at(&mut injector, 100, 100);

    injector.key_down(30);
    injector.mouse_down(1);
    injector.key_down(31);
    injector.leave();

    // Exactly one release for each of k1, k2, b1.
    let events = events_of(&log);
    let ups: Vec<_> = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                RecordedEvent::Key { down: false, .. } | RecordedEvent::Button { down: false, .. }
            )
        })
        .collect();
    assert_eq!(ups.len(), 3);
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == RecordedEvent::Key { code: 30, down: false })
            .count(),
        1
    );
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == RecordedEvent::Key { code: 31, down: false })
            .count(),
        1
    );
    assert_eq!(
        events
            .iter()
            .filter(|e| **e
                == RecordedEvent::Button {
                    code: ecodes::BTN_LEFT,
                    down: false
                })
            .count(),
        1
    );

    assert!(injector.pressed_keys().is_empty());
    assert!(injector.pressed_buttons().is_empty());
    assert_eq!(state.get(), SessionState::Connected);
}

#[test]
fn test_leave_releases_scancodes_30_and_31_last() {
    let (mut injector, log, _, _) = make_injector(no_throttle());
    enter_at(&mut injector, 0, 0);

    injector.key_down(30);
    injector.key_down(31);
    injector.leave();

    // The emitted stream must end with key-ups for 30 and 31, in some order.
    let events = events_of(&log);
    let tail: Vec<_> = events[events.len() - 2..].to_vec();
    assert!(tail.contains(&RecordedEvent::Key { code: 30, down: false }));
    assert!(tail.contains(&RecordedEvent::Key { code: 31, down: false }));
}

#[test]
fn test_device_write_failure_still_updates_release_tracking() {
    let log = event_log();
    let mouse = MockMouse::new(Arc::clone(&log));
    let mut keyboard = MockKeyboard::new(Arc::clone(&log));
    keyboard.fail_writes = true;
    let state = StateHandle::new();
    state.set(SessionState::Connected);
    let cursor = CursorContext::new(Box::new(MockScreenProbe::sized(1920, 1080)), None);
    let mut injector = InputInjector::new(
        Box::new(mouse),
        Box::new(keyboard),
        cursor,
        state,
        no_throttle(),
    );
    enter_at(&mut injector, 0, 0);

    // The write is rejected, but the press is tracked anyway so the later
    // release keeps the set consistent (no phantom press).
    injector.key_down(30);
    assert!(injector.pressed_keys().contains(&30));
    injector.key_up(30);
    assert!(injector.pressed_keys().is_empty());
}

#[test]
fn test_handlers_are_gated_outside_active_state() {
    let (mut injector, log, state, _) = make_injector(no_throttle());
    assert_eq!(state.get(), SessionState::Connected);

    injector.key_down(30);
    injector.mouse_down(1);
    injector.mouse_move(10, 10);

    assert!(events_of(&log).is_empty());
    assert!(injector.pressed_keys().is_empty());
    assert!(injector.pressed_buttons().is_empty());
}

// ── Key repeat ────────────────────────────────────────────────────────────────

#[test]
fn test_key_repeat_of_held_key_is_ignored() {
    let (mut injector, log, _, _) = make_injector(no_throttle());
    enter_at(&mut injector, 0, 0);

    injector.key_down(30);
    injector.key_repeat(30);
    injector.key_repeat(30);

    let downs = events_of(&log)
        .iter()
        .filter(|e| **e == RecordedEvent::Key { code: 30, down: true })
        .count();
    assert_eq!(downs, 1, "OS auto-repeat handles held keys");
}

#[test]
fn test_key_repeat_of_unheld_key_is_a_fresh_down() {
    let (mut injector, log, _, _) = make_injector(no_throttle());
    enter_at(&mut injector, 0, 0);

    injector.key_repeat(30);

    assert!(events_of(&log).contains(&RecordedEvent::Key { code: 30, down: true }));
    assert!(injector.pressed_keys().contains(&30));
}

// ── Mouse motion ──────────────────────────────────────────────────────────────

#[test]
fn test_relative_mode_alternates_delta_and_reseed() {
    // Scenario: enter at (100,100) with sync_freq 2; first accepted DMMV is
    // relative, second is an absolute reseed.
    let (mut injector, log, _, _) = make_injector(no_throttle());
    enter_at(&mut injector, 100, 100);

    injector.mouse_move(110, 105);
    assert_eq!(injector.logical_cursor(), (110, 105));

    injector.mouse_move(120, 110);
    assert_eq!(injector.logical_cursor(), (120, 110));

    assert_eq!(
        events_of(&log),
        vec![
            RecordedEvent::MouseAbsolute { x: 100, y: 100 }, // entry warp
            RecordedEvent::MouseRelative { dx: 10, dy: 5 },
            RecordedEvent::MouseAbsolute { x: 120, y: 110 },
        ]
    );
}

#[test]
fn test_relative_drift_is_bounded_by_reseeds() {
    let (mut injector, log, _, _) = make_injector(InjectorSettings {
        move_threshold: Duration::ZERO,
        sync_freq: 3,
        ..InjectorSettings::default()
    });
    enter_at(&mut injector, 0, 0);

    let targets = [(10, 10), (20, 15), (30, 30), (35, 45), (50, 50), (60, 60)];
    for (x, y) in targets {
        injector.mouse_move(x, y);
    }

    assert_eq!(
        events_of(&log),
        vec![
            RecordedEvent::MouseAbsolute { x: 0, y: 0 }, // entry warp
            RecordedEvent::MouseRelative { dx: 10, dy: 10 },
            RecordedEvent::MouseRelative { dx: 10, dy: 5 },
            RecordedEvent::MouseAbsolute { x: 30, y: 30 }, // 3rd accepted: reseed
            RecordedEvent::MouseRelative { dx: 5, dy: 15 },
            RecordedEvent::MouseRelative { dx: 15, dy: 5 },
            RecordedEvent::MouseAbsolute { x: 60, y: 60 }, // 6th accepted: reseed
        ]
    );
    // Between reseeds the emitted deltas sum to the position difference:
    // (10+10, 10+5) = (20,15) and (5+15, 15+5) = (20,20) = (50,50)-(30,30).
    assert_eq!(injector.logical_cursor(), (60, 60));
}

#[test]
fn test_absolute_mode_always_moves_absolutely() {
    let (mut injector, log, _, _) = make_injector(InjectorSettings {
        abs_mouse_move: true,
        move_threshold: Duration::ZERO,
        ..InjectorSettings::default()
    });
    enter_at(&mut injector, 0, 0);

    injector.mouse_move(10, 20);
    injector.mouse_move(30, 40);

    assert_eq!(
        events_of(&log),
        vec![
            RecordedEvent::MouseAbsolute { x: 0, y: 0 },
            RecordedEvent::MouseAbsolute { x: 10, y: 20 },
            RecordedEvent::MouseAbsolute { x: 30, y: 40 },
        ]
    );
}

#[test]
fn test_moves_inside_threshold_window_are_dropped() {
    let (mut injector, log, _, _) = make_injector(InjectorSettings {
        // A threshold no test run can beat.
        move_threshold: Duration::from_secs(3600),
        ..InjectorSettings::default()
    });
    enter_at(&mut injector, 100, 100);

    injector.mouse_move(110, 105); // first move: nothing to throttle against
    injector.mouse_move(120, 110); // inside the window: dropped

    let moves: Vec<_> = events_of(&log)
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                RecordedEvent::MouseRelative { .. } | RecordedEvent::MouseAbsolute { .. }
            )
        })
        .collect();
    // Entry warp plus exactly one emitted move.
    assert_eq!(moves.len(), 2);
    // The dropped event did not advance the logical cursor either.
    assert_eq!(injector.logical_cursor(), (110, 105));
}

#[test]
fn test_relative_move_passes_deltas_through() {
    let (mut injector, log, _, _) = make_injector(no_throttle());
    enter_at(&mut injector, 0, 0);

    injector.mouse_rel_move(-30, 10);
    injector.mouse_rel_move(0, 0); // no-op

    let rels: Vec<_> = events_of(&log)
        .into_iter()
        .filter(|e| matches!(e, RecordedEvent::MouseRelative { .. }))
        .collect();
    assert_eq!(rels, vec![RecordedEvent::MouseRelative { dx: -30, dy: 10 }]);
}

#[test]
fn test_wheel_quantises_to_one_click_per_axis() {
    let (mut injector, log, _, _) = make_injector(no_throttle());
    enter_at(&mut injector, 0, 0);

    injector.mouse_wheel(0, 120);
    injector.mouse_wheel(-240, -360);
    injector.mouse_wheel(0, 0);

    let wheels: Vec<_> = events_of(&log)
        .into_iter()
        .filter(|e| matches!(e, RecordedEvent::Wheel { .. }))
        .collect();
    assert_eq!(
        wheels,
        vec![
            RecordedEvent::Wheel { dy: 1, dx: 0 },
            RecordedEvent::Wheel { dy: -1, dx: -1 },
        ]
    );
}

// ── Modifier synchronisation ──────────────────────────────────────────────────

#[test]
fn test_enter_taps_lock_keys_that_disagree_with_leds() {
    let (mut injector, log, _, leds) = make_injector(no_throttle());
    // Local NumLock LED is on, the server says NumLock off and CapsLock on.
    leds.lock().unwrap().insert(LockKey::NumLock, true);

    injector.enter(&EnterMsg {
        entry_x: 0,
        entry_y: 0,
        sequence: 1,
        mod_mask: modifier::CAPS_LOCK,
    });

    let events = events_of(&log);
    // CapsLock: off locally, on remotely -> tap.
    assert!(events.contains(&RecordedEvent::Key {
        code: ecodes::KEY_CAPSLOCK,
        down: true
    }));
    assert!(events.contains(&RecordedEvent::Key {
        code: ecodes::KEY_CAPSLOCK,
        down: false
    }));
    // NumLock: on locally, off remotely -> tap.
    assert!(events.contains(&RecordedEvent::Key {
        code: ecodes::KEY_NUMLOCK,
        down: true
    }));
    // ScrollLock agrees (off/off) -> untouched.
    assert!(!events
        .iter()
        .any(|e| matches!(e, RecordedEvent::Key { code, .. } if *code == ecodes::KEY_SCROLLLOCK)));
}

#[test]
fn test_enter_presses_and_releases_plain_modifiers_by_mask_diff() {
    let (mut injector, log, _, _) = make_injector(no_throttle());

    injector.enter(&EnterMsg {
        entry_x: 0,
        entry_y: 0,
        sequence: 1,
        mod_mask: modifier::SHIFT | modifier::CONTROL,
    });
    assert!(events_of(&log).contains(&RecordedEvent::Key {
        code: ecodes::KEY_LEFTSHIFT,
        down: true
    }));
    assert!(events_of(&log).contains(&RecordedEvent::Key {
        code: ecodes::KEY_LEFTCTRL,
        down: true
    }));
    assert_eq!(
        injector.current_modifiers(),
        modifier::SHIFT | modifier::CONTROL
    );

    // Re-enter with Shift cleared: only the changed bit moves.
    injector.enter(&EnterMsg {
        entry_x: 0,
        entry_y: 0,
        sequence: 2,
        mod_mask: modifier::CONTROL,
    });
    assert!(events_of(&log).contains(&RecordedEvent::Key {
        code: ecodes::KEY_LEFTSHIFT,
        down: false
    }));
    let ctrl_downs = events_of(&log)
        .iter()
        .filter(|e| {
            **e == RecordedEvent::Key {
                code: ecodes::KEY_LEFTCTRL,
                down: true,
            }
        })
        .count();
    assert_eq!(ctrl_downs, 1, "unchanged modifier must not be re-pressed");
    assert_eq!(injector.current_modifiers(), modifier::CONTROL);
}

#[test]
fn test_modifiers_asserted_on_enter_are_released_on_leave() {
    let (mut injector, log, _, _) = make_injector(no_throttle());
    injector.enter(&EnterMsg {
        entry_x: 0,
        entry_y: 0,
        sequence: 1,
        mod_mask: modifier::SHIFT,
    });
    injector.leave();

    assert!(events_of(&log).contains(&RecordedEvent::Key {
        code: ecodes::KEY_LEFTSHIFT,
        down: false
    }));
    assert!(injector.pressed_keys().is_empty());
}

// ── Query reply ───────────────────────────────────────────────────────────────

#[test]
fn test_screen_info_reports_geometry_and_reconciled_cursor() {
    let log = event_log();
    let mouse = MockMouse::new(Arc::clone(&log));
    let keyboard = MockKeyboard::new(Arc::clone(&log));
    let state = StateHandle::new();
    let probe = MockScreenProbe {
        size: Some((1920, 1080)),
        cursor: Some((122, 110)),
    };
    let cursor = CursorContext::new(Box::new(probe), None);
    let mut injector = InputInjector::new(
        Box::new(mouse),
        Box::new(keyboard),
        cursor,
        state,
        no_throttle(),
    );

    let reply = injector.screen_info();
    match reply {
        Message::ScreenInfo(info) => {
            assert_eq!((info.left, info.top), (0, 0));
            assert_eq!((info.width, info.height), (1920, 1080));
            assert_eq!(info.warp_zone, 0);
            assert_eq!((info.mouse_x, info.mouse_y), (122, 110));
        }
        other => panic!("expected ScreenInfo, got {other:?}"),
    }
}

// ── Dispatcher ordering and lifecycle ─────────────────────────────────────────

#[derive(Clone, Default)]
struct RecordingSink {
    sent: Arc<Mutex<Vec<Message>>>,
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send(&self, msg: &Message) {
        self.sent.lock().unwrap().push(msg.clone());
    }

    async fn shutdown(&self) {}
}

#[tokio::test]
async fn test_worker_processes_messages_in_arrival_order() {
    let (injector, log, _, _) = make_injector(no_throttle());

    let sink = RecordingSink::default();
    let running = Arc::new(AtomicBool::new(true));
    let (tx, rx) = dispatch_channel();
    let worker = Worker::new(rx, injector, sink.clone(), Arc::clone(&running));
    let worker_task = tokio::spawn(worker.run());

    let messages = vec![
        Message::Enter(EnterMsg {
            entry_x: 5,
            entry_y: 5,
            sequence: 1,
            mod_mask: 0,
        }),
        Message::KeyDown(KeyDownMsg {
            key_id: 0x61,
            mod_mask: 0,
            key_button: 30,
        }),
        Message::MouseDown { button: 1 },
        Message::KeyDown(KeyDownMsg {
            key_id: 0x73,
            mod_mask: 0,
            key_button: 31,
        }),
        Message::KeyUp(KeyUpMsg {
            key_id: 0x61,
            mod_mask: 0,
            key_button: 30,
        }),
        Message::QueryInfo,
        Message::Leave,
    ];
    for msg in messages {
        tx.send(msg).await.unwrap();
    }
    drop(tx); // queue closes; worker drains, releases, and stops
    worker_task.await.unwrap();

    // The device stream reflects exactly the arrival order.
    let events: Vec<RecordedEvent> = log
        .lock()
        .unwrap()
        .iter()
        .filter(|e| {
            matches!(
                e,
                RecordedEvent::Key { .. }
                    | RecordedEvent::Button { .. }
                    | RecordedEvent::MouseAbsolute { .. }
            )
        })
        .cloned()
        .collect();
    assert_eq!(
        events,
        vec![
            RecordedEvent::MouseAbsolute { x: 5, y: 5 },
            RecordedEvent::Key { code: 30, down: true },
            RecordedEvent::Button {
                code: ecodes::BTN_LEFT,
                down: true
            },
            RecordedEvent::Key { code: 31, down: true },
            RecordedEvent::Key { code: 30, down: false },
            // Leave releases what is still held: button first, then key 31.
            RecordedEvent::Button {
                code: ecodes::BTN_LEFT,
                down: false
            },
            RecordedEvent::Key { code: 31, down: false },
        ]
    );

    // QINF produced exactly one DINF through the sink.
    let sent = sink.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], Message::ScreenInfo(_)));

    // The worker closed both devices on exit.
    let raw = log.lock().unwrap();
    assert!(raw.contains(&RecordedEvent::MouseClosed));
    assert!(raw.contains(&RecordedEvent::KeyboardClosed));
}

#[tokio::test]
async fn test_worker_stops_on_protocol_error() {
    let (injector, _log, state, _) = make_injector(no_throttle());
    let sink = RecordingSink::default();
    let running = Arc::new(AtomicBool::new(true));
    let (tx, rx) = dispatch_channel();
    let worker = Worker::new(rx, injector, sink, Arc::clone(&running));
    let worker_task = tokio::spawn(worker.run());

    tx.send(Message::ErrorBusy).await.unwrap();
    worker_task.await.unwrap();

    assert!(!running.load(std::sync::atomic::Ordering::Relaxed));
    // tx still open: the worker exited on the shutdown flag, not queue close.
    drop(tx);
    let _ = state;
}
