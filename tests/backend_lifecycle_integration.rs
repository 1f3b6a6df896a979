//! Integration tests for backend lifecycle
//!
//! These tests validate the complete backend workflow against the mock device:
//! - Backend startup and shutdown
//! - Device connection, streaming and measurements
//! - Detach handling and reconnect
//!
//! Run with `cargo test --features mock-device`.

#![cfg(feature = "mock-device")]

mod common;

use common::recv_until;
use common::test_timeout;
use scopevis_rs::backend::{BackendMessage, MockDevice, MockDeviceConfig, ScopeBackend};
use scopevis_rs::config::AppConfig;
use scopevis_rs::error::DeviceFaultKind;
use scopevis_rs::pipeline::ScopeEvent;
use scopevis_rs::types::{ConnectionStatus, InputSource, Measurement};
use serial_test::serial;
use std::thread;
use std::time::Duration;

fn fast_mock() -> MockDevice {
    MockDevice::new(MockDeviceConfig {
        frame_len: 64,
        frame_interval: Duration::from_millis(5),
        ..Default::default()
    })
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.demo.tick_ms = 5;
    config.measurement.request_every = 2;
    config
}

fn is_device_frame(msg: &BackendMessage) -> bool {
    matches!(
        msg,
        BackendMessage::Scope(ScopeEvent::Frame {
            source: InputSource::Device,
            ..
        })
    )
}

#[test]
#[serial]
fn test_backend_creation_and_shutdown() {
    let (backend, frontend) = ScopeBackend::with_transport(test_config(), Box::new(fast_mock()));

    // Spawn backend thread
    let handle = thread::spawn(move || backend.run());

    // Demo frames flow without any device
    let (got_frame, _) = recv_until(&frontend.receiver, test_timeout(), |m| {
        matches!(m, BackendMessage::Scope(ScopeEvent::Frame { .. }))
    });
    assert!(got_frame);

    // Shutdown
    frontend.shutdown();
    let (got_shutdown, _) = recv_until(&frontend.receiver, test_timeout(), |m| {
        matches!(m, BackendMessage::Shutdown)
    });
    assert!(got_shutdown);

    // Backend should exit cleanly
    assert!(handle.join().is_ok(), "Backend thread should exit cleanly");
}

#[test]
#[serial]
fn test_device_frames_and_measurements() {
    let (backend, frontend) = ScopeBackend::with_transport(test_config(), Box::new(fast_mock()));
    let handle = thread::spawn(move || backend.run());

    frontend.select_source(InputSource::Device);

    let (connected, _) = recv_until(&frontend.receiver, test_timeout(), |m| {
        matches!(
            m,
            BackendMessage::Scope(ScopeEvent::ConnectionStatus(ConnectionStatus::Connected))
        )
    });
    assert!(connected);

    let (got_frame, _) = recv_until(&frontend.receiver, test_timeout(), is_device_frame);
    assert!(got_frame, "mock device should stream frames after Start");

    let (got_freq, _) = recv_until(&frontend.receiver, test_timeout(), |m| {
        matches!(
            m,
            BackendMessage::Scope(ScopeEvent::Measurement(Measurement::Frequency(hz))) if *hz > 0.0
        )
    });
    assert!(got_freq, "frequency reply expected after measurement request");

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
#[serial]
fn test_detach_reports_fault_and_reconnects() {
    let device = fast_mock();
    let detach = device.detach_handle();
    let (backend, frontend) = ScopeBackend::with_transport(test_config(), Box::new(device));
    let handle = thread::spawn(move || backend.run());

    frontend.select_source(InputSource::Device);
    let (got_frame, _) = recv_until(&frontend.receiver, test_timeout(), is_device_frame);
    assert!(got_frame);

    detach.detach();
    let (faulted, _) = recv_until(&frontend.receiver, test_timeout(), |m| {
        matches!(
            m,
            BackendMessage::Scope(ScopeEvent::DeviceFault(f)) if f.kind == DeviceFaultKind::Disconnected
        )
    });
    assert!(faulted);

    // User-initiated reconnect
    frontend.select_source(InputSource::Device);
    let (got_frame, _) = recv_until(&frontend.receiver, test_timeout(), is_device_frame);
    assert!(got_frame, "frames resume after reconnect");

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
#[serial]
fn test_pause_stops_device_frames() {
    let (backend, frontend) = ScopeBackend::with_transport(test_config(), Box::new(fast_mock()));
    let handle = thread::spawn(move || backend.run());

    frontend.select_source(InputSource::Device);
    let (got_frame, _) = recv_until(&frontend.receiver, test_timeout(), is_device_frame);
    assert!(got_frame);

    frontend.set_streaming(false);
    let (paused, _) = recv_until(&frontend.receiver, test_timeout(), |m| {
        matches!(m, BackendMessage::Scope(ScopeEvent::StreamingChanged(false)))
    });
    assert!(paused);

    // Events are ordered, so nothing after the pause acknowledgement is a frame
    let (more, _) = recv_until(&frontend.receiver, Duration::from_millis(250), is_device_frame);
    assert!(!more, "no frames while paused");

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
#[serial]
fn test_switch_to_mock_device_at_runtime() {
    let mut config = test_config();
    config.device.use_mock = false;
    let (backend, frontend) = ScopeBackend::new(config);
    let handle = thread::spawn(move || backend.run());

    frontend.use_mock_device(true);
    frontend.select_source(InputSource::Device);

    let (connected, _) = recv_until(&frontend.receiver, test_timeout(), |m| {
        matches!(
            m,
            BackendMessage::Scope(ScopeEvent::ConnectionStatus(ConnectionStatus::Connected))
        )
    });
    assert!(connected);

    frontend.request_stats();
    let (got_stats, _) = recv_until(&frontend.receiver, test_timeout(), |m| {
        matches!(m, BackendMessage::Stats(_))
    });
    assert!(got_stats);

    frontend.shutdown();
    handle.join().unwrap();
}
