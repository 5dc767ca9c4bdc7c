use domain::value::{
    assign_char, assign_rgbw, decode_char, decode_double, decode_rgbw, decode_temp_hum,
    encode_double, encode_temp_hum, initial_value, store_reported,
};
use domain::{ChannelFunction, ChannelType, RgbwValue};

#[test]
fn normally_closed_sensor_starts_closed_and_inverts_reports() {
    let fresh = initial_value(ChannelType::SensorNc);
    assert_eq!(decode_double(ChannelType::SensorNc, &fresh), 1.0);

    let opened = store_reported(ChannelType::SensorNc, &[1, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(decode_double(ChannelType::SensorNc, &opened), 0.0);

    let closed = store_reported(ChannelType::SensorNc, &[0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(decode_double(ChannelType::SensorNc, &closed), 1.0);
}

#[test]
fn normally_open_sensor_stores_report_verbatim() {
    assert_eq!(initial_value(ChannelType::SensorNo), [0; 8]);
    let stored = store_reported(ChannelType::SensorNo, &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(stored, [1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(decode_char(&stored), 1);
}

#[test]
fn rgbw_color_survives_assign_then_decode() {
    let assigned = assign_rgbw(
        ChannelFunction::RgbLighting,
        RgbwValue {
            color: 0xAABBCC,
            color_brightness: 80,
            brightness: 40,
        },
    );
    assert_eq!(&assigned[..5], &[0, 80, 0xCC, 0xBB, 0xAA]);

    let decoded = decode_rgbw(ChannelType::RgbLedController, &assigned).expect("rgb type");
    assert_eq!(decoded.color, 0xAABBCC);
    assert_eq!(decoded.color_brightness, 80);
    assert_eq!(decoded.brightness, 0);
}

#[test]
fn rgbw_out_of_range_percentages_decode_to_zero() {
    let raw = [150, 101, 1, 2, 3, 0, 0, 0];
    let decoded = decode_rgbw(ChannelType::DimmerAndRgbLed, &raw).expect("combined type");
    assert_eq!(decoded.brightness, 0);
    assert_eq!(decoded.color_brightness, 0);
    assert_eq!(decoded.color, 0x030201);
}

#[test]
fn rgbw_read_requires_capable_type() {
    assert!(decode_rgbw(ChannelType::Relay, &[50; 8]).is_none());
    let dimmer = decode_rgbw(ChannelType::Dimmer, &[50, 60, 1, 1, 1, 0, 0, 0]).expect("dimmer");
    assert_eq!(dimmer.brightness, 50);
    assert_eq!(dimmer.color_brightness, 0);
    assert_eq!(dimmer.color, 0);
}

#[test]
fn pure_dimmer_function_never_writes_color_bytes() {
    let assigned = assign_rgbw(
        ChannelFunction::Dimmer,
        RgbwValue {
            color: 0xFFFFFF,
            color_brightness: 90,
            brightness: 70,
        },
    );
    assert_eq!(assigned, [70, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn assign_char_keeps_tail_of_current_value() {
    let assigned = assign_char(&[9, 8, 7, 6, 5, 4, 3, 2], 1);
    assert_eq!(assigned, [1, 8, 7, 6, 5, 4, 3, 2]);
}

#[test]
fn dht_decodes_milli_units() {
    let raw = encode_temp_hum(21_500, 45_000);
    let reading = decode_temp_hum(7, ChannelType::Dht22, ChannelFunction::HumidityAndTemperature, &raw)
        .expect("valid reading");
    assert_eq!(reading.channel_id, 7);
    assert_eq!(reading.temperature, 21.5);
    assert_eq!(reading.humidity, Some(45.0));
    assert!(reading.is_temp_and_humidity());
}

#[test]
fn dht_negative_humidity_is_unavailable() {
    let raw = encode_temp_hum(21_500, -1);
    assert!(decode_temp_hum(7, ChannelType::Am2302, ChannelFunction::Humidity, &raw).is_none());
}

#[test]
fn dht_requires_climate_function() {
    let raw = encode_temp_hum(21_500, 45_000);
    assert!(decode_temp_hum(7, ChannelType::Dht11, ChannelFunction::None, &raw).is_none());
}

#[test]
fn ds18b20_reports_temperature_only_within_window() {
    let raw = encode_double(-12.25);
    let reading = decode_temp_hum(3, ChannelType::ThermometerDs18b20, ChannelFunction::Thermometer, &raw)
        .expect("valid reading");
    assert_eq!(reading.temperature, -12.25);
    assert_eq!(reading.humidity, None);

    let frozen = encode_double(-273.0);
    assert!(
        decode_temp_hum(3, ChannelType::ThermometerDs18b20, ChannelFunction::Thermometer, &frozen)
            .is_none()
    );
}

#[test]
fn distance_sensor_decodes_double() {
    let raw = encode_double(1.75);
    assert_eq!(decode_double(ChannelType::DistanceSensor, &raw), 1.75);
}
