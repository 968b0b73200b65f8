//! Shared schemas and builders for the integration tests.
#![allow(dead_code)]

use fixedwire::*;

message! {
    /// A required positive value with up to three positive history samples.
    pub struct Reading {
        type_id: 0x0100,
        rules: no_cross_check,
        fields {
            1 => pub value: ScalarField<i32, (Positive, Required)> = (Positive, Required),
            2 => pub history: ArrayField<i32, Positive, NoValidation, 3> = (Positive, NoValidation),
        }
    }
}

wire_enum! {
    pub enum Mode {
        Idle = 0,
        Armed = 1,
        Tripped = 9,
    }
}

pub const PORT_LIMITS: InRange<u16> = InRange::new(1, 1000);

/// An armed unit must carry a label.
pub fn armed_needs_label(t: &Telemetry) -> Result<(), Rejection> {
    if t.mode.get() == Mode::Armed && !t.label.is_set() {
        return Err(Rejection::new("armed_label", "armed units need a label"));
    }
    Ok(())
}

message! {
    /// One of every field kind, including a nested submessage.
    pub struct Telemetry {
        type_id: 0x0200,
        rules: armed_needs_label,
        fields {
            1 => pub mode: EnumField<Mode, NoValidation> = NoValidation,
            2 => pub online: ScalarField<bool, NoValidation> = NoValidation,
            3 => pub ratio: ScalarField<f64, InRange<f64>> = InRange::new(0.0, 1.0),
            4 => pub label: StringField<16, NonEmpty> = NonEmpty,
            5 => pub ports: MapField<u8, u16, OnValue<InRange<u16>>, NoValidation, 4> = (OnValue(PORT_LIMITS), NoValidation),
            6 => pub reading: MessageField<Reading, Required> = Required,
            7 => pub flags: ArrayField<u8, NoValidation, ExactCount, 2> = (NoValidation, ExactCount(2)),
        }
    }
}

pub fn reading(value: i32, history: &[i32]) -> Reading {
    let mut r = Reading::default();
    r.value.set(value).unwrap();
    if !history.is_empty() {
        r.history.set(history).unwrap();
    }
    r
}

/// A fully populated, valid telemetry message.
pub fn telemetry() -> Telemetry {
    let mut t = Telemetry::default();
    t.mode.set(Mode::Armed).unwrap();
    t.online.set(true).unwrap();
    t.ratio.set(0.25).unwrap();
    t.label.set("pump-7").unwrap();
    t.ports.add(1, 80).unwrap();
    t.ports.add(2, 443).unwrap();
    t.reading.set(reading(12, &[3, 4])).unwrap();
    t.flags.set(&[0xA, 0xB]).unwrap();
    t
}

/// The smallest valid telemetry message: only the required submessage.
pub fn minimal_telemetry() -> Telemetry {
    let mut t = Telemetry::default();
    t.reading.set(reading(1, &[])).unwrap();
    t
}

/// Flips one bit of `frame` at `index`.
pub fn flip(frame: &[u8], index: usize) -> Vec<u8> {
    let mut corrupted = frame.to_vec();
    corrupted[index] ^= 0x01;
    corrupted
}
