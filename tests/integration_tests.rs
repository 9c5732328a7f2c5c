//! Integration tests for stepper-coprocessor.
//!
//! These tests verify the complete pipeline from TOML configuration through
//! driver bring-up, segment calculation and interrupt dispatch, against a
//! recording bus double and embedded-hal-mock SPI/pin mocks.

use std::collections::VecDeque;

use proptest::prelude::*;

use stepper_coprocessor::registers::{self, ramp_mode, ramp_stat};
use stepper_coprocessor::{
    Axis, Bus, DispatchTimer, KinematicBlock, MotionController, MotionPlanner, MotionSegment,
    Result, SegmentBuffer, SpiTransport,
};

// =============================================================================
// Test configuration data
// =============================================================================

const MACHINE_CONFIG: &str = r#"
[axes.x]
run_current = 16
hold_current = 8
steps_per_mm = 80.0
endstop = { position = "left" }

[axes.y]
run_current = 16
hold_current = 8
steps_per_mm = 80.0
endstop = { position = "left" }

[axes.z]
run_current = 20
hold_current = 10
steps_per_mm = 400.0
homing_bump_divisor = 4
endstop = { position = "left" }
final_speed_ceiling = 800

[axes.e]
run_current = 18
hold_current = 6
steps_per_mm = 95.0
invert_direction = true
final_speed_ceiling = 800
"#;

// =============================================================================
// Test doubles
// =============================================================================

/// Register write as seen by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RegWrite {
    address: u8,
    data: u32,
    axis: Axis,
}

/// Recording bus; reads always report a standstill axis.
#[derive(Default)]
struct RecordingBus {
    writes: Vec<RegWrite>,
}

impl RecordingBus {
    fn writes_to(&self, address: u8) -> Vec<&RegWrite> {
        self.writes.iter().filter(|w| w.address == address).collect()
    }

    fn writes_for(&self, axis: Axis) -> Vec<&RegWrite> {
        self.writes.iter().filter(|w| w.axis == axis).collect()
    }
}

impl Bus for RecordingBus {
    fn read_register(&mut self, _address: u8, _axis: Axis) -> Result<u32> {
        Ok(ramp_stat::VZERO)
    }

    fn write_register(&mut self, address: u8, data: u32, axis: Axis) -> Result<u8> {
        self.writes.push(RegWrite {
            address,
            data,
            axis,
        });
        Ok(0)
    }

    fn read_status(&mut self, _axis: Axis) -> Result<u8> {
        Ok(0)
    }
}

#[derive(Default)]
struct TestTimer {
    count: u16,
    started_with: Option<u16>,
}

impl DispatchTimer for TestTimer {
    fn start(&mut self, compare: u16) {
        self.started_with = Some(compare);
        self.count = 0;
    }

    fn count(&self) -> u16 {
        self.count
    }

    fn set_count(&mut self, value: u16) {
        self.count = value;
    }
}

/// Planner double backed by a queue of blocks.
struct QueuePlanner {
    blocks: VecDeque<KinematicBlock>,
}

impl QueuePlanner {
    fn new(blocks: impl IntoIterator<Item = KinematicBlock>) -> Self {
        Self {
            blocks: blocks.into_iter().collect(),
        }
    }
}

impl MotionPlanner for QueuePlanner {
    fn current_block(&mut self) -> Option<KinematicBlock> {
        self.blocks.front().copied()
    }

    fn discard_current_block(&mut self) {
        self.blocks.pop_front();
    }
}

fn block(steps: [u32; 4], direction_bits: u8) -> KinematicBlock {
    let step_event_count = *steps.iter().max().unwrap();
    KinematicBlock {
        steps,
        step_event_count,
        initial_rate: 120,
        nominal_rate: 4000,
        final_rate: 120,
        acceleration_steps_per_s2: 3000,
        direction_bits,
        accelerate_until: step_event_count / 4,
        decelerate_after: step_event_count - step_event_count / 4,
    }
}

type TestController =
    MotionController<RecordingBus, TestTimer, embedded_hal_mock::eh1::delay::NoopDelay, 16>;

fn controller() -> TestController {
    let config = stepper_coprocessor::parse_config(MACHINE_CONFIG).expect("config should parse");
    MotionController::new(
        RecordingBus::default(),
        TestTimer::default(),
        embedded_hal_mock::eh1::delay::NoopDelay::new(),
        config,
    )
}

// =============================================================================
// Driver bring-up
// =============================================================================

#[test]
fn init_programs_every_axis() {
    let mut c = controller();
    c.init().expect("init should succeed");

    let (bus, timer, _) = c.release();

    for axis in Axis::ALL {
        let writes = bus.writes_for(axis);
        assert_eq!(writes.len(), 9, "nine init writes per axis");
        assert_eq!(writes[0].address, registers::IHOLD_IRUN);
    }

    // Run/hold currents come from the configuration
    let current = bus.writes_to(registers::IHOLD_IRUN);
    assert_eq!(current[0].data, registers::ihold_irun(8, 16, 7));
    assert_eq!(current[2].data, registers::ihold_irun(10, 20, 7));

    // Only the extruder has its direction inverted
    let gconf = bus.writes_to(registers::GCONF);
    assert_eq!(gconf[0].data, registers::GCONF_STEALTH);
    assert_eq!(
        gconf[3].data,
        registers::GCONF_STEALTH | registers::GCONF_SHAFT
    );

    // The extruder has no switch wired
    let sw = bus.writes_to(registers::SW_MODE);
    assert_ne!(sw[0].data, 0);
    assert_eq!(sw[3].data, 0);

    assert!(timer.started_with.is_some());
}

#[test]
fn init_is_not_reentrant() {
    let mut c = controller();
    c.init().expect("first init should succeed");
    assert!(c.init().is_err());
}

// =============================================================================
// Calculate/dispatch pipeline
// =============================================================================

#[test]
fn pipeline_single_axis_move() {
    let mut c = controller();
    let mut planner = QueuePlanner::new([block([1600, 0, 0, 0], 0)]);

    assert!(c.calculate(&mut planner));
    assert_eq!(c.queued_segments(), 1);
    assert_eq!(c.position(Axis::X), 1600);
    // The planner's block was consumed
    assert!(!c.calculate(&mut planner));

    c.isr().expect("isr should succeed");
    assert_eq!(c.queued_segments(), 0);

    let (bus, _, _) = c.release();

    // No Z motion in the block: no Z writes at all
    assert!(bus.writes.iter().all(|w| w.axis != Axis::Z));

    // Target is the accumulated absolute position
    let targets = bus.writes_to(registers::XTARGET);
    assert_eq!(targets.len(), 3);
    assert_eq!(targets[0].axis, Axis::X);
    assert_eq!(targets[0].data, 1600);
}

#[test]
fn pipeline_tracks_negative_motion() {
    let mut c = controller();
    let mut planner = QueuePlanner::new([
        block([1600, 800, 0, 0], 0),
        block([400, 0, 0, 0], Axis::X.bit()),
    ]);

    assert!(c.calculate(&mut planner));
    assert!(c.calculate(&mut planner));

    assert_eq!(c.position(Axis::X), 1200);
    assert_eq!(c.position(Axis::Y), 800);
    assert_eq!(c.direction(Axis::X), -1);
    assert_eq!(c.direction(Axis::Y), 1);
}

#[test]
fn pipeline_carries_idle_axis_forward() {
    let mut c = controller();
    let mut planner = QueuePlanner::new([block([1600, 800, 0, 0], 0), block([400, 0, 0, 0], 0)]);

    assert!(c.calculate(&mut planner));
    c.isr().expect("isr should succeed");
    // Drain the segment's countdown across interrupt firings
    while c.countdown() != 0 {
        c.isr().expect("isr should succeed");
    }

    // Second block moves only X; Y keeps the first block's programming
    assert!(c.calculate(&mut planner));
    c.isr().expect("isr should succeed");

    let (bus, _, _) = c.release();
    let y_targets: Vec<u32> = bus
        .writes
        .iter()
        .filter(|w| w.address == registers::XTARGET && w.axis == Axis::Y)
        .map(|w| w.data)
        .collect();
    // Both dispatches command the same Y target
    assert_eq!(y_targets, vec![800, 800]);

    let y_speeds: Vec<u32> = bus
        .writes
        .iter()
        .filter(|w| w.address == registers::VMAX && w.axis == Axis::Y)
        .map(|w| w.data)
        .collect();
    assert_eq!(y_speeds.len(), 2);
    assert_eq!(y_speeds[0], y_speeds[1]);
}

#[test]
fn calculate_stops_at_full_queue() {
    let mut c: MotionController<RecordingBus, TestTimer, embedded_hal_mock::eh1::delay::NoopDelay, 4> =
        MotionController::new(
            RecordingBus::default(),
            TestTimer::default(),
            embedded_hal_mock::eh1::delay::NoopDelay::new(),
            stepper_coprocessor::parse_config(MACHINE_CONFIG).expect("config should parse"),
        );
    let blocks: Vec<KinematicBlock> = (0..6).map(|_| block([100, 0, 0, 0], 0)).collect();
    let mut planner = QueuePlanner::new(blocks);

    for _ in 0..4 {
        assert!(c.calculate(&mut planner));
    }
    // Queue full: refused, position unchanged, block not consumed
    let position_before = c.position(Axis::X);
    assert!(!c.calculate(&mut planner));
    assert_eq!(c.position(Axis::X), position_before);
    assert_eq!(planner.blocks.len(), 2);

    // Dispatching one segment frees exactly one slot
    c.isr().expect("isr should succeed");
    assert!(c.calculate(&mut planner));
    assert!(!c.calculate(&mut planner));
}

// =============================================================================
// Position override
// =============================================================================

#[test]
fn set_position_reprograms_driver_around_hold() {
    let mut c = controller();
    c.set_position(Axis::X, 4200).expect("set_position");
    assert_eq!(c.position(Axis::X), 4200);

    let (bus, _, _) = c.release();
    let addresses: Vec<u8> = bus.writes.iter().map(|w| w.address).collect();
    assert_eq!(
        addresses,
        vec![
            registers::RAMPMODE,
            registers::XTARGET,
            registers::XACTUAL,
            registers::RAMPMODE
        ]
    );
    assert_eq!(bus.writes[0].data, ramp_mode::HOLD);
    assert_eq!(bus.writes[3].data, ramp_mode::POSITIONING);
}

#[test]
fn set_position_skips_noop() {
    let mut c = controller();
    c.set_position(Axis::X, 0).expect("set_position");
    let (bus, _, _) = c.release();
    assert!(bus.writes.is_empty());
}

// =============================================================================
// Homing
// =============================================================================

#[test]
fn switch_homing_uses_configured_bump() {
    let mut c = controller();
    // Z: 400 steps/mm, bump 2 mm, divisor 4
    c.home_axis(Axis::Z, 10.0, || {}).expect("homing");

    let (bus, _, _) = c.release();
    let vmax: Vec<u32> = bus
        .writes_to(registers::VMAX)
        .iter()
        .map(|w| w.data)
        .collect();
    assert_eq!(vmax, vec![4000, 1000]);

    let targets: Vec<u32> = bus
        .writes_to(registers::XTARGET)
        .iter()
        .map(|w| w.data)
        .collect();
    assert_eq!(targets, vec![0, 800, 0]);
}

#[test]
fn homing_resets_axis_position() {
    let mut c = controller();
    let mut planner = QueuePlanner::new([block([0, 0, 2000, 0], 0)]);
    assert!(c.calculate(&mut planner));
    assert_eq!(c.position(Axis::Z), 2000);

    c.home_axis(Axis::Z, 10.0, || {}).expect("homing");
    assert_eq!(c.position(Axis::Z), 0);
}

// =============================================================================
// SPI transport framing
// =============================================================================

mod spi_framing {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    fn quiet_pin() -> PinMock {
        PinMock::new(&[])
    }

    fn toggled_pin() -> PinMock {
        PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ])
    }

    #[test]
    fn write_frame_is_five_bytes_msb_first() {
        let expectations = [
            SpiTransaction::transfer_in_place(
                vec![registers::VMAX | registers::WRITE_ACCESS, 0x00, 0x01, 0x02, 0x03],
                vec![0x85, 0x00, 0x00, 0x00, 0x00],
            ),
            SpiTransaction::flush(),
        ];
        let spi = SpiMock::new(&expectations);
        let cs = [quiet_pin(), toggled_pin(), quiet_pin(), quiet_pin()];

        let mut transport = SpiTransport::new(spi, cs, NoopDelay::new());
        let status = transport
            .write_register(registers::VMAX, 0x0001_0203, Axis::Y)
            .expect("write should succeed");
        assert_eq!(status, 0x85);

        let (mut spi, mut cs, _) = transport.release();
        spi.done();
        for pin in &mut cs {
            pin.done();
        }
    }

    #[test]
    fn read_needs_two_frames() {
        // The first frame's payload belongs to the previously addressed
        // register and must be discarded
        let expectations = [
            SpiTransaction::transfer_in_place(
                vec![registers::XACTUAL, 0, 0, 0, 0],
                vec![0x01, 0xDE, 0xAD, 0xBE, 0xEF],
            ),
            SpiTransaction::flush(),
            SpiTransaction::transfer_in_place(
                vec![registers::XACTUAL, 0, 0, 0, 0],
                vec![0x01, 0x00, 0x00, 0x12, 0x34],
            ),
            SpiTransaction::flush(),
        ];
        let spi = SpiMock::new(&expectations);
        let cs = [
            PinMock::new(&[
                PinTransaction::set(State::Low),
                PinTransaction::set(State::High),
                PinTransaction::set(State::Low),
                PinTransaction::set(State::High),
            ]),
            quiet_pin(),
            quiet_pin(),
            quiet_pin(),
        ];

        let mut transport = SpiTransport::new(spi, cs, NoopDelay::new());
        let value = transport
            .read_register(registers::XACTUAL, Axis::X)
            .expect("read should succeed");
        assert_eq!(value, 0x1234);

        let (mut spi, mut cs, _) = transport.release();
        spi.done();
        for pin in &mut cs {
            pin.done();
        }
    }
}

// =============================================================================
// Segment queue properties
// =============================================================================

proptest! {
    #[test]
    fn segment_queue_preserves_fifo_order(tags in prop::collection::vec(0u32..10_000, 1..64)) {
        let mut buffer: SegmentBuffer<8> = SegmentBuffer::new();
        let mut expected = VecDeque::new();

        for &tag in &tags {
            if buffer.is_full() {
                // Consume one to make room, checking order on the way out
                prop_assert_eq!(buffer.peek().map(|s| s.duration), expected.pop_front());
                buffer.discard();
            }
            let slot = buffer.try_enqueue();
            prop_assert!(slot.is_some());
            if let Some(slot) = slot {
                *slot = MotionSegment::EMPTY;
                slot.duration = tag;
                slot.ready = true;
            }
            buffer.commit();
            expected.push_back(tag);
        }

        while let Some(front) = expected.pop_front() {
            prop_assert_eq!(buffer.peek().map(|s| s.duration), Some(front));
            buffer.discard();
        }
        prop_assert!(buffer.is_empty());
    }
}
