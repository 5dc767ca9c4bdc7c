//! 通道值编解码：8 字节原始缓冲区与语义值之间的映射。
//!
//! 所有函数都是纯函数，不持有状态；读侧按通道类型解释，写侧按通道功能组装。

use crate::channel::{ChannelFunction, ChannelType};

/// 通道值缓冲区长度。
pub const CHANNEL_VALUE_SIZE: usize = 8;

/// 通道原始值。
pub type RawValue = [u8; CHANNEL_VALUE_SIZE];

const TEMPERATURE_MIN_EXCLUSIVE: f64 = -273.0;
const TEMPERATURE_MAX: f64 = 1000.0;
const PERCENT_MAX: u8 = 100;

/// RGBW 语义值。`color` 为 0xRRGGBB 形式的 24 位颜色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RgbwValue {
    pub color: u32,
    pub color_brightness: u8,
    pub brightness: u8,
}

/// 温湿度快照（按需从原始值派生，不落库）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempHum {
    pub channel_id: i32,
    pub temperature: f64,
    /// 仅温度时为 `None`。
    pub humidity: Option<f64>,
}

impl TempHum {
    pub fn is_temp_and_humidity(&self) -> bool {
        self.humidity.is_some()
    }
}

/// 新建通道的初始值：常闭传感器首字节为 1。
pub fn initial_value(channel_type: ChannelType) -> RawValue {
    let mut value = [0u8; CHANNEL_VALUE_SIZE];
    if channel_type == ChannelType::SensorNc {
        value[0] = 1;
    }
    value
}

/// 设备上报值落地：整体覆盖，常闭传感器反转首字节。
pub fn store_reported(channel_type: ChannelType, reported: &RawValue) -> RawValue {
    let mut value = *reported;
    if channel_type == ChannelType::SensorNc {
        value[0] = if value[0] == 0 { 1 } else { 0 };
    }
    value
}

pub fn decode_double(channel_type: ChannelType, value: &RawValue) -> f64 {
    match channel_type {
        ChannelType::SensorNo | ChannelType::SensorNc => {
            if value[0] == 1 {
                1.0
            } else {
                0.0
            }
        }
        ChannelType::ThermometerDs18b20 | ChannelType::DistanceSensor => f64::from_le_bytes(*value),
        _ => 0.0,
    }
}

pub fn decode_char(value: &RawValue) -> u8 {
    value[0]
}

/// 读 RGBW。类型既无亮度也无颜色能力时返回 `None`。
pub fn decode_rgbw(channel_type: ChannelType, value: &RawValue) -> Option<RgbwValue> {
    if !channel_type.has_brightness() && !channel_type.has_color() {
        return None;
    }

    let mut rgbw = RgbwValue::default();
    if channel_type.has_brightness() {
        rgbw.brightness = clamp_percent(value[0]);
    }
    if channel_type.has_color() {
        rgbw.color_brightness = clamp_percent(value[1]);
        rgbw.color = (u32::from(value[4]) << 16) | (u32::from(value[3]) << 8) | u32::from(value[2]);
    }
    Some(rgbw)
}

/// 解码温湿度；不满足类型/功能组合或读数越界时返回 `None`。
pub fn decode_temp_hum(
    channel_id: i32,
    channel_type: ChannelType,
    function: ChannelFunction,
    value: &RawValue,
) -> Option<TempHum> {
    if channel_type == ChannelType::ThermometerDs18b20 && function == ChannelFunction::Thermometer {
        let temperature = decode_double(channel_type, value);
        return valid_temperature(temperature).then_some(TempHum {
            channel_id,
            temperature,
            humidity: None,
        });
    }

    let reports_climate = matches!(
        function,
        ChannelFunction::Thermometer
            | ChannelFunction::Humidity
            | ChannelFunction::HumidityAndTemperature
    );
    if !channel_type.is_temp_hum_sensor() || !reports_climate {
        return None;
    }

    let temperature = f64::from(read_i32_le(value, 0)) / 1000.0;
    let humidity = f64::from(read_i32_le(value, 4)) / 1000.0;
    if valid_temperature(temperature) && (0.0..=100.0).contains(&humidity) {
        Some(TempHum {
            channel_id,
            temperature,
            humidity: Some(humidity),
        })
    } else {
        None
    }
}

/// 组装 RGBW 写命令：只写入功能暴露的字段，其余保持为 0。
pub fn assign_rgbw(function: ChannelFunction, rgbw: RgbwValue) -> RawValue {
    let mut value = [0u8; CHANNEL_VALUE_SIZE];
    if function.writes_brightness() {
        value[0] = clamp_percent(rgbw.brightness);
    }
    if function.writes_color() {
        value[1] = clamp_percent(rgbw.color_brightness);
        value[2] = (rgbw.color & 0xFF) as u8;
        value[3] = ((rgbw.color >> 8) & 0xFF) as u8;
        value[4] = ((rgbw.color >> 16) & 0xFF) as u8;
    }
    value
}

/// 组装单字节写命令：复制当前值，替换首字节。
pub fn assign_char(current: &RawValue, char_value: u8) -> RawValue {
    let mut value = *current;
    value[0] = char_value;
    value
}

/// DHT 类传感器的上报格式（测试与模拟设备使用）。
pub fn encode_temp_hum(temperature_milli: i32, humidity_milli: i32) -> RawValue {
    let mut value = [0u8; CHANNEL_VALUE_SIZE];
    value[..4].copy_from_slice(&temperature_milli.to_le_bytes());
    value[4..].copy_from_slice(&humidity_milli.to_le_bytes());
    value
}

pub fn encode_double(reading: f64) -> RawValue {
    reading.to_le_bytes()
}

fn clamp_percent(raw: u8) -> u8 {
    if raw > PERCENT_MAX { 0 } else { raw }
}

fn valid_temperature(temperature: f64) -> bool {
    temperature > TEMPERATURE_MIN_EXCLUSIVE && temperature <= TEMPERATURE_MAX
}

fn read_i32_le(value: &RawValue, offset: usize) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&value[offset..offset + 4]);
    i32::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_treats_out_of_range_as_zero() {
        assert_eq!(clamp_percent(100), 100);
        assert_eq!(clamp_percent(101), 0);
        assert_eq!(clamp_percent(255), 0);
    }

    #[test]
    fn relay_double_is_zero() {
        assert_eq!(decode_double(ChannelType::Relay, &[1; 8]), 0.0);
    }
}
