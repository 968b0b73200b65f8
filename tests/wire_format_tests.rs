//! Byte-exact checks of both body layouts and the envelope around them.

use fixedwire::*;

mod test_harness;
use test_harness::*;

message! {
    struct Sparse {
        type_id: 0xBEEF,
        rules: no_cross_check,
        fields {
            1 => a: ScalarField<u8, NoValidation> = NoValidation,
            2 => b: ScalarField<u16, NoValidation> = NoValidation,
        }
    }
}

fn crc16_trailer(covered: &[u8]) -> [u8; 2] {
    (Crc16.calculate(covered) as u16).to_le_bytes()
}

#[test]
fn tlv_frame_bytes() {
    let mut buffer = get_buffer!(Reading, NoChecksum, Tlv);
    serialize(&mut buffer, &reading(5, &[1, 2])).unwrap();
    assert_eq!(
        buffer.as_bytes(),
        &[
            0x01, 0x00, 0x01, // tlv, type 0x0100
            1, 4, 0, 5, 0, 0, 0, // value
            2, 8, 0, 1, 0, 0, 0, 2, 0, 0, 0, // history
        ]
    );
}

#[test]
fn static_frame_bytes() {
    let mut buffer = get_buffer!(Reading, NoChecksum, StaticLayout);
    serialize(&mut buffer, &reading(5, &[1, 2])).unwrap();
    assert_eq!(
        buffer.as_bytes(),
        &[
            0x02, 0x00, 0x01, // static, type 0x0100
            0b11, // both fields set
            5, 0, 0, 0, // value
            2, 0, 1, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, // history, one spare slot
        ]
    );
}

#[test]
fn static_frames_have_constant_length() {
    let mut buffer = get_buffer!(Reading, Crc16, StaticLayout);
    serialize(&mut buffer, &reading(1, &[])).unwrap();
    let short = buffer.len();
    serialize(&mut buffer, &reading(1, &[1, 2, 3])).unwrap();
    assert_eq!(buffer.len(), short);
    assert_eq!(short, HEADER_LEN + Reading::FIXED_LEN + 2);
    assert_eq!(short, buffer.capacity());
}

#[test]
fn crc16_trailer_covers_header_and_body() {
    let mut buffer = get_buffer!(Reading);
    serialize(&mut buffer, &reading(7, &[])).unwrap();
    let frame = buffer.as_bytes();
    let (covered, trailer) = frame.split_at(frame.len() - 2);
    assert_eq!(covered, &[0x01, 0x00, 0x01, 1, 4, 0, 7, 0, 0, 0]);
    assert_eq!(trailer, &crc16_trailer(covered));
}

#[test]
fn empty_message_is_header_and_trailer() {
    let mut buffer = get_buffer!(Sparse);
    serialize(&mut buffer, &Sparse::default()).unwrap();
    let covered = [0x01, 0xEF, 0xBE];
    let trailer = crc16_trailer(&covered);
    assert_eq!(
        buffer.as_bytes(),
        &[covered[0], covered[1], covered[2], trailer[0], trailer[1]]
    );
    assert_eq!(deserialize(&buffer).unwrap(), Sparse::default());
}

#[test]
fn nested_message_is_a_tlv_body_in_a_tlv_value() {
    let mut buffer = get_buffer!(Telemetry, NoChecksum, Tlv);
    serialize(&mut buffer, &minimal_telemetry()).unwrap();
    assert_eq!(
        buffer.as_bytes(),
        &[0x01, 0x00, 0x02, 6, 7, 0, 1, 4, 0, 1, 0, 0, 0]
    );
}

#[test]
fn nested_message_is_a_static_body_in_a_slot() {
    let mut buffer = get_buffer!(Telemetry, NoChecksum, StaticLayout);
    serialize(&mut buffer, &minimal_telemetry()).unwrap();
    let frame = buffer.as_bytes();
    assert_eq!(frame.len(), HEADER_LEN + Telemetry::FIXED_LEN);
    // Only the submessage bit (index 5) is set.
    assert_eq!(frame[3], 1 << 5);
    // bitmap + mode + online + ratio + label + ports
    let offset = HEADER_LEN + 1 + 2 + 1 + 8 + 18 + 14;
    assert_eq!(&frame[offset..offset + 5], &[0b01, 1, 0, 0, 0]);
}

#[test]
fn schema_sizes() {
    assert_eq!(Reading::FIXED_LEN, 1 + 4 + 2 + 12);
    assert_eq!(Reading::MAX_TAGGED_LEN, (3 + 4) + (3 + 12));
    assert_eq!(Telemetry::FIXED_LEN, 1 + 2 + 1 + 8 + 18 + 14 + 19 + 4);
    assert_eq!(
        Telemetry::MAX_TAGGED_LEN,
        (3 + 2) + (3 + 1) + (3 + 8) + (3 + 16) + (3 + 12) + (3 + 22) + (3 + 2)
    );
    assert_eq!(capacity::<Telemetry, Crc16, StaticLayout>(), 3 + 67 + 2);
    assert_eq!(capacity::<Telemetry, Crc16, Tlv>(), 3 + 84 + 2);
}

#[test]
fn descriptors_describe_the_schema() {
    let kinds: Vec<FieldKind> = Telemetry::DESCRIPTORS.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        [
            FieldKind::Enum,
            FieldKind::Scalar,
            FieldKind::Scalar,
            FieldKind::String,
            FieldKind::Map,
            FieldKind::Message,
            FieldKind::Array,
        ]
    );
    assert_eq!(Telemetry::NAME, "Telemetry");
    assert_eq!(Telemetry::DESCRIPTORS[4].name, "ports");
    assert_eq!(Telemetry::DESCRIPTORS[4].fixed_width, 2 + 4 * 3);
}

#[test]
fn descriptors_carry_types_bounds_and_chains() {
    let history = Reading::DESCRIPTORS[1];
    assert_eq!(history.kind, FieldKind::Array);
    assert_eq!(
        history.element,
        Some(ElementType {
            kind: FieldKind::Scalar,
            name: "i32"
        })
    );
    assert_eq!(history.capacity, 3);
    assert_eq!(history.validators, "(Positive, NoValidation)");

    let ports = Telemetry::DESCRIPTORS[4];
    assert_eq!(ports.element.map(|e| e.name), Some("u8"));
    assert_eq!(ports.value.map(|e| e.name), Some("u16"));
    assert_eq!(ports.capacity, 4);

    let mode = Telemetry::DESCRIPTORS[0];
    assert_eq!(
        mode.element,
        Some(ElementType {
            kind: FieldKind::Enum,
            name: "Mode"
        })
    );
    assert_eq!(mode.validators, "NoValidation");

    let label = Telemetry::DESCRIPTORS[3];
    assert_eq!((label.element, label.capacity), (None, 16));

    let nested = Telemetry::DESCRIPTORS[5];
    assert_eq!(nested.element.map(|e| (e.kind, e.name)), Some((FieldKind::Message, "Reading")));
    assert_eq!(nested.max_len, Reading::MAX_TAGGED_LEN);
    assert_eq!(nested.validators, "Required");
}

#[test]
fn unknown_tags_from_newer_senders_are_ignored() {
    // value=3 plus a field 0x40 this schema does not know.
    let mut frame = vec![0x01u8, 0x00, 0x01, 0x40, 2, 0, 0xAA, 0xBB, 1, 4, 0, 3, 0, 0, 0];
    let trailer = crc16_trailer(&frame);
    frame.extend_from_slice(&trailer);

    let mut buffer = get_buffer!(Reading);
    buffer.load(&frame).unwrap();
    assert_eq!(deserialize(&buffer).unwrap(), reading(3, &[]));
}
