//! Integration tests for the SDR control engine
//!
//! These tests drive a `Controller` over a `VirtualUsrp` end to end:
//! - Validation of conflicting and malformed commands
//! - Channel and motherboard scope resolution
//! - Tune resolution and the hardware calls it produces
//! - Timed scheduling, re-arming, cancellation and firing order
//! - Partial application when the hardware rejects a directive
//! - Wire decoding of dictionary and legacy tuple commands

use sdr_command::{wire, Command, CommandError, GpioDirective, Timestamp, TuneRequest, Value};
use sdr_control::{
    ApplyReport, ControlError, ControlEvent, Controller, SlotState, Submission, Target,
};
use sdr_sim::{HardwareCall, SimClock, VirtualUsrp, VirtualUsrpConfig};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Controller over a default two-channel device, plus its clock
    pub fn controller() -> (Controller<VirtualUsrp>, SimClock) {
        controller_with(VirtualUsrpConfig::default())
    }

    /// Controller over a device with a specific shape
    pub fn controller_with(config: VirtualUsrpConfig) -> (Controller<VirtualUsrp>, SimClock) {
        let usrp = VirtualUsrp::from_config(config);
        let clock = usrp.clock();
        (Controller::new(usrp), clock)
    }

    /// Device configuration with `channels` channels and `mboards` motherboards
    pub fn shape(channels: usize, mboards: usize) -> VirtualUsrpConfig {
        VirtualUsrpConfig {
            channels,
            mboards,
            ..Default::default()
        }
    }

    /// Calls recorded so far
    pub fn calls(ctl: &Controller<VirtualUsrp>) -> Vec<HardwareCall> {
        ctl.hardware().call_log().calls()
    }

    /// Channels that received a tune call, in call order
    pub fn tuned_channels(calls: &[HardwareCall]) -> Vec<usize> {
        calls
            .iter()
            .filter_map(|c| match c {
                HardwareCall::Tune { chan, .. } => Some(*chan),
                _ => None,
            })
            .collect()
    }

    /// Check if events contain a BatchApplied for a time
    pub fn has_applied_at(events: &[ControlEvent], time: Timestamp) -> bool {
        events
            .iter()
            .any(|e| matches!(e, ControlEvent::BatchApplied { at: Some(t), .. } if *t == time))
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

mod validation_tests {
    use super::*;

    #[test]
    fn test_freq_and_lo_freq_conflict() {
        let (mut ctl, _) = helpers::controller();
        let err = ctl
            .submit(Command::new().with("freq", 1e9).with("lo_freq", 1e9))
            .unwrap_err();

        assert!(matches!(
            err,
            ControlError::Command(CommandError::ConflictingKeys { .. })
        ));
        assert!(helpers::calls(&ctl).is_empty());
    }

    #[test]
    fn test_tune_and_freq_conflict() {
        let (mut ctl, _) = helpers::controller();
        let err = ctl
            .submit(
                Command::new()
                    .with("tune", TuneRequest::new(1e9))
                    .with("freq", 1e9),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ControlError::Command(CommandError::ConflictingKeys { .. })
        ));
    }

    #[test]
    fn test_type_mismatch_aborts_whole_command() {
        let (mut ctl, _) = helpers::controller();
        let err = ctl
            .submit(Command::new().with("gain", 10.0).with("antenna", 3))
            .unwrap_err();

        assert!(matches!(
            err,
            ControlError::Command(CommandError::TypeMismatch { .. })
        ));
        // Nothing applied, not even the valid gain
        assert!(helpers::calls(&ctl).is_empty());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let (mut ctl, _) = helpers::controller();
        let result = ctl
            .submit(Command::new().with("volume", 11).with("gain", 4.0))
            .unwrap();

        assert_eq!(
            result,
            Submission::Applied(ApplyReport {
                mboard: 0,
                applied: 2
            })
        );
        let events = ctl.drain_events();
        assert!(events.contains(&ControlEvent::KeysIgnored {
            keys: vec!["volume".to_string()]
        }));
    }

    #[test]
    fn test_unrecognized_direction_ignored() {
        let (mut ctl, _) = helpers::controller();
        let result = ctl
            .submit(Command::new().with("direction", "SIDEWAYS").with("gain", 1.0))
            .unwrap();
        assert!(matches!(result, Submission::Applied(_)));
    }
}

// ============================================================================
// Scope Tests
// ============================================================================

mod scope_tests {
    use super::*;

    #[test]
    fn test_chan_minus_one_covers_all_channels() {
        let (mut ctl, _) = helpers::controller_with(helpers::shape(4, 1));
        ctl.submit(Command::new().with("chan", -1).with("freq", 915e6))
            .unwrap();

        assert_eq!(helpers::tuned_channels(&helpers::calls(&ctl)), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_freq_tunes_every_channel() {
        let (mut ctl, _) = helpers::controller();
        ctl.submit(Command::new().with("freq", 1.1e9)).unwrap();

        assert_eq!(
            helpers::calls(&ctl),
            vec![
                HardwareCall::Tune {
                    chan: 0,
                    request: TuneRequest::with_lo_offset(1.1e9, 0.0)
                },
                HardwareCall::Tune {
                    chan: 1,
                    request: TuneRequest::with_lo_offset(1.1e9, 0.0)
                },
            ]
        );
        for chan in 0..2 {
            assert_eq!(ctl.hardware().channel(chan).unwrap().center_freq(), 1.1e9);
        }
    }

    #[test]
    fn test_chan_one_tunes_only_channel_one() {
        let (mut ctl, _) = helpers::controller();
        ctl.submit(Command::new().with("freq", 1.1e9).with("chan", 1))
            .unwrap();

        assert_eq!(helpers::tuned_channels(&helpers::calls(&ctl)), vec![1]);
        assert_eq!(ctl.hardware().channel(0).unwrap().lo_freq, 0.0);
    }

    #[test]
    fn test_rate_applies_to_every_channel() {
        let (mut ctl, _) = helpers::controller();
        ctl.submit(Command::new().with("rate", 1e6).with("chan", 1))
            .unwrap();

        assert_eq!(
            helpers::calls(&ctl),
            vec![
                HardwareCall::SetSampRate { chan: 0, hz: 1e6 },
                HardwareCall::SetSampRate { chan: 1, hz: 1e6 },
            ]
        );
    }

    #[test]
    fn test_chan_out_of_range() {
        let (mut ctl, _) = helpers::controller();
        let err = ctl
            .submit(Command::new().with("chan", 2).with("gain", 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            ControlError::ChannelOutOfRange {
                chan: 2,
                channels: 2
            }
        );
        assert!(helpers::calls(&ctl).is_empty());
    }

    #[test]
    fn test_gpio_targets_selected_mboard() {
        let (mut ctl, _) = helpers::controller_with(helpers::shape(2, 2));
        let gpio = GpioDirective::new("FP0", "OUT", 0x5 as f64, 0xF as f64);
        ctl.submit(Command::new().with("gpio", gpio).with("mboard", 1))
            .unwrap();

        assert_eq!(ctl.hardware().gpio_attr(1, "FP0", "OUT"), Some(0x5));
        assert_eq!(ctl.hardware().gpio_attr(0, "FP0", "OUT"), None);
    }
}

// ============================================================================
// Tuning Tests
// ============================================================================

mod tuning_tests {
    use super::*;

    #[test]
    fn test_lo_offset_carried_into_request() {
        let (mut ctl, _) = helpers::controller();
        ctl.submit(
            Command::new()
                .with("freq", 2.4e9)
                .with("lo_offset", 5e6)
                .with("chan", 0),
        )
        .unwrap();

        let state = ctl.hardware().channel(0).unwrap();
        assert_eq!(state.lo_freq, 2.405e9);
        assert_eq!(state.center_freq(), 2.4e9);
    }

    #[test]
    fn test_manual_stages_passed_through() {
        let (mut ctl, _) = helpers::controller();
        ctl.submit(
            Command::new()
                .with("lo_freq", 1e9)
                .with("dsp_freq", 2e6)
                .with("chan", 0),
        )
        .unwrap();

        assert_eq!(
            helpers::calls(&ctl),
            vec![
                HardwareCall::SetLoFreq { chan: 0, hz: 1e9 },
                HardwareCall::SetDspFreq { chan: 0, hz: 2e6 },
            ]
        );
    }
}

// ============================================================================
// Scheduling Tests
// ============================================================================

mod scheduling_tests {
    use super::*;

    #[test]
    fn test_timed_dictionary_arms_then_fires_together() {
        let (mut ctl, clock) = helpers::controller();
        let at = Timestamp::new(100, 0.5);

        let result = ctl
            .submit(
                Command::new()
                    .with("freq", 2.4e9)
                    .with("gain", 23.0)
                    .with("antenna", "TX/RX")
                    .with("time", at),
            )
            .unwrap();
        assert_eq!(
            result,
            Submission::Armed {
                mboard: 0,
                at,
                replaced: None
            }
        );
        assert!(matches!(
            ctl.pending(0).unwrap(),
            SlotState::Armed { at: t, directives: 6, .. } if t == at
        ));

        clock.set(Timestamp::new(100, 0.49));
        assert!(ctl.poll().is_empty());
        assert!(helpers::calls(&ctl).is_empty());

        clock.set(Timestamp::new(101, 0.0));
        assert_eq!(ctl.poll().len(), 1);
        assert_eq!(ctl.pending(0).unwrap(), SlotState::Idle);

        let calls = helpers::calls(&ctl);
        assert_eq!(calls.len(), 6);
        for chan in 0..2 {
            let state = ctl.hardware().channel(chan).unwrap();
            assert_eq!(state.center_freq(), 2.4e9);
            assert_eq!(state.gain, 23.0);
            assert_eq!(state.antenna.as_deref(), Some("TX/RX"));
        }
        assert!(helpers::has_applied_at(&ctl.drain_events(), at));

        // Fired batches do not fire again
        assert!(ctl.poll().is_empty());
    }

    #[test]
    fn test_rearm_applies_only_second_batch() {
        let (mut ctl, clock) = helpers::controller();
        ctl.submit(
            Command::new()
                .with("gain", 10.0)
                .with("time", Timestamp::new(5, 0.0)),
        )
        .unwrap();
        let second = ctl
            .submit(
                Command::new()
                    .with("gain", 20.0)
                    .with("time", Timestamp::new(6, 0.0)),
            )
            .unwrap();
        assert_eq!(
            second,
            Submission::Armed {
                mboard: 0,
                at: Timestamp::new(6, 0.0),
                replaced: Some(Timestamp::new(5, 0.0))
            }
        );

        clock.set(Timestamp::new(10, 0.0));
        ctl.poll();

        assert_eq!(
            helpers::calls(&ctl),
            vec![
                HardwareCall::SetGain { chan: 0, db: 20.0 },
                HardwareCall::SetGain { chan: 1, db: 20.0 },
            ]
        );
    }

    #[test]
    fn test_clear_cancels_pending_batch() {
        let (mut ctl, clock) = helpers::controller();
        ctl.submit(
            Command::new()
                .with("gain", 10.0)
                .with("time", Timestamp::new(5, 0.0)),
        )
        .unwrap();

        let result = ctl
            .submit(Command::new().with("time", Value::Clear))
            .unwrap();
        assert_eq!(result, Submission::Empty);
        assert_eq!(ctl.pending(0).unwrap(), SlotState::Idle);

        clock.set(Timestamp::new(10, 0.0));
        assert!(ctl.poll().is_empty());
        assert!(helpers::calls(&ctl).is_empty());
    }

    #[test]
    fn test_rx_fires_before_tx() {
        let (mut ctl, clock) = helpers::controller_with(helpers::shape(2, 3));
        let at = Timestamp::new(1, 0.0);
        let gpio = GpioDirective::new("FP0", "OUT", 1.0, 1.0);

        for (mboard, direction) in [(0, Some("TX")), (1, None), (2, Some("RX"))] {
            let mut cmd = Command::new()
                .with("gpio", gpio.clone())
                .with("mboard", mboard)
                .with("time", at);
            if let Some(direction) = direction {
                cmd.insert("direction", direction);
            }
            ctl.submit(cmd).unwrap();
        }

        clock.set(at);
        let order: Vec<_> = ctl.poll().into_iter().map(|r| r.unwrap().mboard).collect();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn test_motherboards_have_independent_slots() {
        let (mut ctl, clock) = helpers::controller_with(helpers::shape(2, 2));
        let gpio = GpioDirective::new("FP0", "OUT", 1.0, 1.0);
        ctl.submit(
            Command::new()
                .with("gpio", gpio.clone())
                .with("mboard", 0)
                .with("time", Timestamp::new(5, 0.0)),
        )
        .unwrap();
        ctl.submit(
            Command::new()
                .with("gpio", gpio)
                .with("mboard", 1)
                .with("time", Timestamp::new(9, 0.0)),
        )
        .unwrap();

        clock.set(Timestamp::new(6, 0.0));
        assert_eq!(ctl.poll().len(), 1);
        assert!(ctl.pending(1).unwrap().is_armed());
    }
}

// ============================================================================
// Hardware Rejection Tests
// ============================================================================

mod rejection_tests {
    use super::*;

    #[test]
    fn test_partial_application_on_rejection() {
        let (mut ctl, _) = helpers::controller();
        let err = ctl
            .submit(
                Command::new()
                    .with("gain", 30.0)
                    .with("antenna", "NOPE")
                    .with("bandwidth", 1e6),
            )
            .unwrap_err();

        match err {
            ControlError::HardwareRejected {
                call,
                target,
                applied,
                ..
            } => {
                assert_eq!(call, "set_antenna");
                assert_eq!(target, Target::Channel(0));
                assert_eq!(applied, 2);
            }
            other => panic!("Expected HardwareRejected, got {:?}", other),
        }

        // Gain stuck on both channels, bandwidth never reached
        assert_eq!(ctl.hardware().channel(0).unwrap().gain, 30.0);
        assert_eq!(ctl.hardware().channel(1).unwrap().gain, 30.0);
        assert_eq!(ctl.hardware().channel(0).unwrap().bandwidth, 0.0);

        let events = ctl.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, ControlEvent::HardwareRejected { applied: 2, .. })));
    }

    #[test]
    fn test_rejected_timed_batch_does_not_block_others() {
        let (mut ctl, clock) = helpers::controller_with(helpers::shape(1, 2));
        let at = Timestamp::new(1, 0.0);
        ctl.submit(
            Command::new()
                .with("gpio", GpioDirective::new("NOPE", "OUT", 1.0, 1.0))
                .with("mboard", 0)
                .with("time", at),
        )
        .unwrap();
        ctl.submit(
            Command::new()
                .with("gpio", GpioDirective::new("FP0", "OUT", 1.0, 1.0))
                .with("mboard", 1)
                .with("time", at),
        )
        .unwrap();

        clock.set(at);
        let results = ctl.poll();
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
        assert_eq!(ctl.hardware().gpio_attr(1, "FP0", "OUT"), Some(1));
    }
}

// ============================================================================
// Wire Tests
// ============================================================================

mod wire_tests {
    use super::*;

    #[test]
    fn test_legacy_tuple_matches_dictionary() {
        let legacy = wire::decode_command(r#"["gain", 10.5, 1]"#).unwrap();
        let dict = wire::decode_command(r#"{"gain": 10.5, "chan": 1}"#).unwrap();
        assert_eq!(legacy, dict);

        let (mut a, _) = helpers::controller();
        let (mut b, _) = helpers::controller();
        a.submit(legacy).unwrap();
        b.submit(dict).unwrap();
        assert_eq!(helpers::calls(&a), helpers::calls(&b));
    }

    #[test]
    fn test_timed_json_command() {
        let (mut ctl, clock) = helpers::controller();
        let result = ctl
            .submit_json(r#"{"freq": 2.4e9, "gain": 23.0, "antenna": "TX/RX", "time": [100, 0.5]}"#)
            .unwrap();
        assert!(matches!(result, Submission::Armed { .. }));

        clock.set(Timestamp::new(100, 0.5));
        assert_eq!(ctl.poll().len(), 1);
        assert_eq!(helpers::calls(&ctl).len(), 6);
    }

    #[test]
    fn test_gpio_round_trip() {
        let gpio = GpioDirective::new("FP0", "DDR", 0xAA as f64, 0xFF as f64).on_mboard(1);
        let cmd = Command::new().with("gpio", gpio.clone());

        let decoded = wire::decode_command(&wire::encode_command(&cmd)).unwrap();
        assert_eq!(decoded.get("gpio"), Some(&Value::Gpio(gpio)));
    }

    #[test]
    fn test_float_written_selectors() {
        let (mut ctl, _) = helpers::controller();
        ctl.submit_json(r#"{"chan": 1.0, "gain": 5}"#).unwrap();
        ctl.submit_json(r#"["gain", 7.0, 0.0]"#).unwrap();
        assert_eq!(
            helpers::calls(&ctl),
            vec![
                HardwareCall::SetGain { chan: 1, db: 5.0 },
                HardwareCall::SetGain { chan: 0, db: 7.0 },
            ]
        );

        let err = ctl.submit_json(r#"{"chan": 0.5, "gain": 5}"#).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Command(CommandError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_tune_object() {
        let (mut ctl, _) = helpers::controller();
        let err = ctl.submit_json(r#"{"tune": {"offset": 1e6}}"#).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Command(CommandError::TypeMismatch { ref key, .. }) if key == "tune"
        ));
        assert!(helpers::calls(&ctl).is_empty());
    }

    #[test]
    fn test_malformed_tuple() {
        let (mut ctl, _) = helpers::controller();
        let err = ctl.submit_json(r#"[3, 4]"#).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Command(CommandError::MalformedTuple(_))
        ));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn rf_frequency() -> impl Strategy<Value = f64> {
        prop_oneof![70e6..1e9f64, 1e9..3e9f64, 3e9..6e9f64]
    }

    proptest! {
        #[test]
        fn selected_channel_is_the_only_one_tuned(
            (channels, chan) in (1usize..8).prop_flat_map(|c| (Just(c), 0..c)),
            freq in rf_frequency()
        ) {
            let (mut ctl, _) = helpers::controller_with(helpers::shape(channels, 1));
            ctl.submit(Command::new().with("freq", freq).with("chan", chan as i64)).unwrap();

            prop_assert_eq!(helpers::tuned_channels(&helpers::calls(&ctl)), vec![chan]);
        }

        #[test]
        fn all_channels_when_unselected(channels in 1usize..8, freq in rf_frequency()) {
            let (mut ctl, _) = helpers::controller_with(helpers::shape(channels, 1));
            ctl.submit(Command::new().with("freq", freq)).unwrap();

            prop_assert_eq!(
                helpers::tuned_channels(&helpers::calls(&ctl)),
                (0..channels).collect::<Vec<_>>()
            );
        }

        #[test]
        fn last_armed_batch_wins(gains in prop::collection::vec(0.0..76.0f64, 1..10)) {
            let (mut ctl, clock) = helpers::controller_with(helpers::shape(1, 1));
            for (i, &gain) in gains.iter().enumerate() {
                ctl.submit(
                    Command::new()
                        .with("gain", gain)
                        .with("time", Timestamp::new(i as i64 + 1, 0.0)),
                ).unwrap();
            }

            clock.set(Timestamp::new(1000, 0.0));
            prop_assert_eq!(ctl.poll().len(), 1);

            let expected = *gains.last().unwrap();
            prop_assert_eq!(
                helpers::calls(&ctl),
                vec![HardwareCall::SetGain { chan: 0, db: expected }]
            );
        }

        #[test]
        fn gpio_wire_round_trip_is_exact(
            value in 0.0..1e9f64,
            mask in 0.0..1e9f64,
            mboard in prop::option::of(0usize..4)
        ) {
            let mut gpio = GpioDirective::new("FP0", "OUT", value, mask);
            gpio.mboard = mboard;
            let cmd = Command::new().with("gpio", gpio.clone());

            let decoded = wire::decode_command(&wire::encode_command(&cmd)).unwrap();
            prop_assert_eq!(decoded.get("gpio"), Some(&Value::Gpio(gpio)));
        }
    }
}
