//! Integration tests for the scope session
//!
//! These tests drive a [`ScopeSession`] the way the backend worker does, with a
//! scripted device link standing in for the serial port:
//! - Device frames split across arbitrary chunks
//! - Measurement requests and replies
//! - Trigger gating on device frames
//! - Detach, reconnect and open failures

mod common;

use common::builders::{chunked, data_line, flat_low, freq_line, rising_step, volt_line, ConfigBuilder};
use common::mock_helpers::{ScriptedLink, ScriptedTransport};
use scopevis_rs::acquisition::DeviceCommand;
use scopevis_rs::config::AppConfig;
use scopevis_rs::error::{DeviceFaultKind, ScopeError};
use scopevis_rs::pipeline::{ScopeEvent, ScopeSession};
use scopevis_rs::types::{
    ConnectionStatus, InputSource, Measurement, TriggerMode, TriggerPhase, TriggerSlope,
    WaveformFrame,
};

type Session = ScopeSession<Vec<ScopeEvent>>;

fn device_session(config: AppConfig) -> (Session, ScriptedLink) {
    let (transport, link) = ScriptedTransport::new();
    let mut session = ScopeSession::new(config, Box::new(transport), Vec::new());
    session.select_source(InputSource::Device);
    assert_eq!(session.connection(), ConnectionStatus::Connected);
    (session, link)
}

/// Feed everything the link has delivered into the session
fn pump(session: &mut Session) {
    let pending: Vec<_> = session
        .device_events()
        .map(|rx| rx.try_iter().collect())
        .unwrap_or_default();
    for event in pending {
        session.on_transport_event(event);
    }
}

fn take_events(session: &mut Session) -> Vec<ScopeEvent> {
    std::mem::take(session.observer_mut())
}

fn frames(events: &[ScopeEvent]) -> Vec<WaveformFrame> {
    events
        .iter()
        .filter_map(|e| match e {
            ScopeEvent::Frame { frame, .. } => Some(frame.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_connect_sends_start() {
    let (_session, link) = device_session(AppConfig::default());
    assert_eq!(link.written(), vec![DeviceCommand::Start]);
    assert_eq!(link.opens(), 1);
}

#[test]
fn test_chunked_frames_are_reassembled() {
    let (mut session, link) = device_session(ConfigBuilder::new().request_every(100).build());
    take_events(&mut session);

    let stream = [data_line(&[0, 1023, 512]), data_line(&[100, 200])].concat();
    for chunk in chunked(stream.as_bytes(), &[3, 1, 7, 64]) {
        assert!(link.push(chunk));
    }
    pump(&mut session);

    let frames = frames(&take_events(&mut session));
    assert_eq!(frames.len(), 2);
    common::assert_float_eq(frames[0].samples()[0] as f64, 0.0, 1e-6);
    common::assert_float_eq(frames[0].samples()[1] as f64, 5.0, 1e-6);
    common::assert_float_eq(frames[1].samples()[1] as f64, 200.0 * 5.0 / 1023.0, 1e-5);
    assert_eq!(session.stats().frames_displayed, 2);
    assert_eq!(session.stats().bytes_received, stream.len() as u64);
}

#[test]
fn test_measurements_requested_and_published() {
    let (mut session, link) = device_session(ConfigBuilder::new().request_every(2).build());
    link.clear_written();

    link.push(data_line(&flat_low(8)).as_bytes());
    link.push(data_line(&flat_low(8)).as_bytes());
    pump(&mut session);
    assert_eq!(
        link.written(),
        vec![DeviceCommand::RequestFrequency, DeviceCommand::RequestVoltage]
    );

    link.push(freq_line(1000.0).as_bytes());
    link.push(volt_line([0.5, 4.5, 2.5, 4.0]).as_bytes());
    pump(&mut session);

    let measurements: Vec<Measurement> = take_events(&mut session)
        .into_iter()
        .filter_map(|e| match e {
            ScopeEvent::Measurement(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(measurements.len(), 2);
    assert_eq!(measurements[0].readout().as_deref(), Some("1000.00 Hz"));
    assert_eq!(measurements[1].readout().as_deref(), Some("Vpp: 4.00V"));
}

#[test]
fn test_malformed_lines_are_dropped() {
    let (mut session, link) = device_session(ConfigBuilder::new().request_every(100).build());
    take_events(&mut session);

    link.push(b"DATA:1,2,x,4\nHELLO\n");
    link.push(data_line(&[1, 2, 3]).as_bytes());
    pump(&mut session);

    assert_eq!(frames(&take_events(&mut session)).len(), 1);
    assert_eq!(session.stats().decode_errors, 2);
}

#[test]
fn test_overflow_resynchronises_on_next_line() {
    let config = ConfigBuilder::new()
        .carry_capacity(32)
        .request_every(100)
        .build();
    let (mut session, link) = device_session(config);
    take_events(&mut session);

    let long = data_line(&vec![512; 64]);
    link.push(long.as_bytes());
    link.push(data_line(&[1, 2, 3]).as_bytes());
    pump(&mut session);

    let events = take_events(&mut session);
    assert!(events.contains(&ScopeEvent::BufferOverflow));
    let frames = frames(&events);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].len(), 3);
}

#[test]
fn test_normal_trigger_gates_device_frames() {
    let config = ConfigBuilder::new()
        .trigger(TriggerMode::Normal, TriggerSlope::Rising)
        .request_every(100)
        .build();
    let (mut session, link) = device_session(config);
    take_events(&mut session);

    link.push(data_line(&flat_low(16)).as_bytes());
    link.push(data_line(&rising_step(16)).as_bytes());
    link.push(data_line(&flat_low(16)).as_bytes());
    pump(&mut session);

    assert_eq!(frames(&take_events(&mut session)).len(), 1);
    assert_eq!(session.stats().frames_received, 3);
}

#[test]
fn test_single_trigger_holds_until_rearmed() {
    let config = ConfigBuilder::new()
        .trigger(TriggerMode::Single, TriggerSlope::Rising)
        .request_every(100)
        .build();
    let (mut session, link) = device_session(config);
    take_events(&mut session);

    link.push(data_line(&rising_step(16)).as_bytes());
    link.push(data_line(&rising_step(16)).as_bytes());
    pump(&mut session);
    assert_eq!(frames(&take_events(&mut session)).len(), 1);
    assert_eq!(session.trigger().phase(), TriggerPhase::Stopped);

    session.rearm_trigger();
    link.push(data_line(&rising_step(16)).as_bytes());
    pump(&mut session);
    assert_eq!(frames(&take_events(&mut session)).len(), 1);
}

#[test]
fn test_pause_and_resume_send_commands() {
    let (mut session, link) = device_session(AppConfig::default());
    link.clear_written();

    session.set_streaming(false);
    session.set_streaming(true);
    assert_eq!(link.written(), vec![DeviceCommand::Pause, DeviceCommand::Start]);
}

#[test]
fn test_detach_then_reconnect() {
    let (mut session, link) = device_session(AppConfig::default());
    take_events(&mut session);

    assert!(link.detach("device detached"));
    pump(&mut session);

    let events = take_events(&mut session);
    assert_eq!(session.connection(), ConnectionStatus::Disconnected);
    assert!(events.iter().any(|e| matches!(
        e,
        ScopeEvent::DeviceFault(f) if f.kind == DeviceFaultKind::Disconnected
    )));
    assert!(session.device_events().is_none());

    // Re-selecting the device is the user-initiated reconnect
    session.select_source(InputSource::Device);
    assert_eq!(session.connection(), ConnectionStatus::Connected);
    assert_eq!(link.opens(), 2);
}

#[test]
fn test_switching_to_demo_closes_link() {
    let (mut session, link) = device_session(AppConfig::default());

    session.select_source(InputSource::Demo);
    assert_eq!(session.source(), InputSource::Demo);
    assert_eq!(session.connection(), ConnectionStatus::Disconnected);
    assert!(!link.push(data_line(&[1, 2]).as_bytes()));
    assert!(session.demo_active());
}

#[test]
fn test_open_failure_reports_fault() {
    let (transport, link) =
        ScriptedTransport::failing(|| ScopeError::PermissionDenied("/dev/ttyACM0".to_string()));
    let mut session = ScopeSession::new(AppConfig::default(), Box::new(transport), Vec::new());

    session.select_source(InputSource::Device);

    assert_eq!(session.connection(), ConnectionStatus::Disconnected);
    assert_eq!(session.source(), InputSource::Device);
    assert_eq!(link.opens(), 1);
    assert!(session.observer().iter().any(|e| matches!(
        e,
        ScopeEvent::DeviceFault(f) if f.kind == DeviceFaultKind::PermissionDenied
    )));
}

#[test]
fn test_demo_ticks_ignored_while_device_active() {
    let (mut session, _link) = device_session(AppConfig::default());
    take_events(&mut session);

    session.on_demo_tick();
    assert!(frames(&take_events(&mut session)).is_empty());
}
