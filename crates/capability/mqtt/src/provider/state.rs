//! 通道状态字段
//!
//! 状态读数来自设备目录中的通道注册表，绑定时一次性取快照，
//! 之后按下标输出 `devices/<deviceId>/channels/<channelId>/state/...`。

use super::MessageProvider;
use crate::message::{MqttMessage, bool_payload, user_topic};
use domain::{ChannelFunction, ChannelId, DeviceId, UserId};
use hub_channels::{DeviceChannel, DeviceDirectory};

/// 一个状态字段（相对 `state/` 的名称与负载）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateField {
    pub name: String,
    pub payload: String,
}

impl StateField {
    fn new(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }
}

/// 计算通道的状态字段。
///
/// 功能为 NONE 时没有任何字段；否则 `connected` 总是第一个，
/// 通道不在注册表中时只有 `connected`。
pub fn channel_state_fields(
    function: ChannelFunction,
    connected: bool,
    channel: Option<&DeviceChannel>,
    companion: Option<&DeviceChannel>,
) -> Vec<StateField> {
    if function == ChannelFunction::None {
        return Vec::new();
    }

    let mut fields = vec![StateField::new("connected", bool_payload(connected))];
    let Some(channel) = channel else {
        return fields;
    };

    match function {
        ChannelFunction::PowerSwitch
        | ChannelFunction::LightSwitch
        | ChannelFunction::StaircaseTimer => {
            fields.push(StateField::new("on", bool_payload(channel.char_value() != 0)));
        }
        ChannelFunction::OpeningSensorGateway
        | ChannelFunction::OpeningSensorGate
        | ChannelFunction::OpeningSensorGarageDoor
        | ChannelFunction::OpeningSensorDoor
        | ChannelFunction::OpeningSensorRollerShutter
        | ChannelFunction::OpeningSensorWindow
        | ChannelFunction::NoLiquidSensor
        | ChannelFunction::MailSensor => {
            fields.push(StateField::new("hi", bool_payload(channel.double_value() > 0.0)));
        }
        ChannelFunction::ControllingTheGatewayLock
        | ChannelFunction::ControllingTheGate
        | ChannelFunction::ControllingTheGarageDoor
        | ChannelFunction::ControllingTheDoorLock => {
            if let Some(sensor) = companion {
                fields.push(StateField::new("hi", bool_payload(sensor.double_value() > 0.0)));
            }
        }
        ChannelFunction::ControllingTheRollerShutter => {
            let shut = channel.char_value() as i8;
            fields.push(StateField::new("is_calibrating", bool_payload(shut < 0)));
            fields.push(StateField::new("shut", shut.max(0).to_string()));
        }
        ChannelFunction::Thermometer
        | ChannelFunction::Humidity
        | ChannelFunction::HumidityAndTemperature => {
            if let Some(reading) = channel.temp_hum() {
                if function != ChannelFunction::Humidity {
                    fields.push(StateField::new("temperature", reading.temperature.to_string()));
                }
                let humidity = reading
                    .humidity
                    .filter(|_| function != ChannelFunction::Thermometer);
                if let Some(humidity) = humidity {
                    fields.push(StateField::new("humidity", humidity.to_string()));
                }
            }
        }
        ChannelFunction::Dimmer
        | ChannelFunction::RgbLighting
        | ChannelFunction::DimmerAndRgbLighting => {
            if let Some(rgbw) = channel.rgbw_value() {
                let brightness = function.writes_brightness();
                let color = function.writes_color();
                let on = (brightness && rgbw.brightness > 0)
                    || (color && rgbw.color_brightness > 0);
                fields.push(StateField::new("on", bool_payload(on)));
                if brightness {
                    fields.push(StateField::new("brightness", rgbw.brightness.to_string()));
                }
                if color {
                    fields.push(StateField::new("color", format!("0x{:06X}", rgbw.color)));
                    fields.push(StateField::new(
                        "color_brightness",
                        rgbw.color_brightness.to_string(),
                    ));
                }
            }
        }
        ChannelFunction::DepthSensor => {
            fields.push(StateField::new("depth", channel.double_value().to_string()));
        }
        ChannelFunction::DistanceSensor => {
            fields.push(StateField::new("distance", channel.double_value().to_string()));
        }
        ChannelFunction::ElectricityMeter => {
            if let Some(measurement) = channel.extended_value() {
                fields.push(StateField::new(
                    "total_forward_active_energy",
                    measurement.total_forward_active_energy().to_string(),
                ));
                for (index, phase) in measurement.phases.iter().enumerate() {
                    let phase_no = index + 1;
                    for (metric, reading) in [
                        ("voltage", phase.voltage),
                        ("current", phase.current),
                        ("power_active", phase.power_active),
                        ("total_forward_active_energy", phase.total_forward_active_energy),
                    ] {
                        fields.push(StateField::new(
                            format!("phases/{}/{}", phase_no, metric),
                            reading.to_string(),
                        ));
                    }
                }
            }
        }
        _ => {}
    }
    fields
}

/// 从目录读取通道快照、关联传感器与在线状态，得到状态字段。
///
/// `function` 为 `None` 时使用注册表中的通道功能。
pub(crate) fn resolve_state_fields(
    directory: &DeviceDirectory,
    user_id: UserId,
    device_id: DeviceId,
    channel_id: ChannelId,
    function: Option<ChannelFunction>,
) -> Vec<StateField> {
    let channel = directory.channel_snapshot(user_id, device_id, channel_id);
    let Some(function) = function.or_else(|| channel.as_ref().map(DeviceChannel::function)) else {
        return Vec::new();
    };
    let companion = channel
        .as_ref()
        .and_then(DeviceChannel::slave_channel)
        .and_then(|sensor_id| directory.find_user_channel(user_id, sensor_id));
    channel_state_fields(
        function,
        directory.is_device_online(user_id, device_id),
        channel.as_ref(),
        companion.as_ref(),
    )
}

pub(crate) fn state_topic(
    topic_prefix: &str,
    user_suid: &str,
    device_id: DeviceId,
    channel_id: ChannelId,
    field: &StateField,
) -> String {
    let suffix = format!(
        "devices/{}/channels/{}/state/{}",
        device_id, channel_id, field.name
    );
    user_topic(topic_prefix, user_suid, &suffix)
}

/// 通道实时状态（CHANNEL_STATE 周期）。
#[derive(Debug, Clone)]
pub struct StateMessageProvider {
    user_id: UserId,
    user_suid: Option<String>,
    device_id: DeviceId,
    channel_id: ChannelId,
    fields: Vec<StateField>,
}

impl StateMessageProvider {
    /// 按 id 从目录解析；用户未注册或通道缺失时不产出消息。
    pub fn resolve(
        directory: &DeviceDirectory,
        user_id: UserId,
        device_id: DeviceId,
        channel_id: ChannelId,
    ) -> Self {
        let user_suid = directory.user_suid(user_id);
        let fields = if user_suid.is_some() {
            resolve_state_fields(directory, user_id, device_id, channel_id, None)
        } else {
            Vec::new()
        };
        Self {
            user_id,
            user_suid,
            device_id,
            channel_id,
            fields,
        }
    }

    pub fn fields(&self) -> &[StateField] {
        &self.fields
    }
}

impl MessageProvider for StateMessageProvider {
    fn message_at_index(&self, index: usize, topic_prefix: &str) -> Option<MqttMessage> {
        let suid = self.user_suid.as_deref()?;
        let field = self.fields.get(index)?;
        Some(MqttMessage::new(
            state_topic(topic_prefix, suid, self.device_id, self.channel_id, field),
            field.payload.clone(),
        ))
    }

    fn owner(&self) -> Option<(UserId, &str)> {
        self.user_suid
            .as_deref()
            .map(|suid| (self.user_id, suid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::value::encode_temp_hum;
    use domain::{ChannelType, ElectricityMeasurement};
    use hub_channels::NoopDeviceRpc;
    use std::sync::Arc;

    fn names(fields: &[StateField]) -> Vec<&str> {
        fields.iter().map(|field| field.name.as_str()).collect()
    }

    fn directory() -> DeviceDirectory {
        let directory = DeviceDirectory::new(Arc::new(NoopDeviceRpc));
        directory.register_user(1, "abc");
        directory
    }

    #[test]
    fn function_none_has_no_state() {
        assert!(channel_state_fields(ChannelFunction::None, true, None, None).is_empty());
    }

    #[test]
    fn connected_comes_first() {
        let fields = channel_state_fields(ChannelFunction::PowerSwitch, false, None, None);
        assert_eq!(fields, vec![StateField::new("connected", "false")]);
    }

    #[test]
    fn gate_reads_hi_from_companion_sensor() {
        let directory = directory();
        let registry = directory.attach_device(1, 10).expect("registry");
        registry.add_channel(1, 0, ChannelType::Relay, ChannelFunction::ControllingTheGate, 500, 2, 0);
        registry.add_channel(2, 1, ChannelType::SensorNo, ChannelFunction::OpeningSensorGate, 1, 0, 0);
        registry.set_value(2, &[1, 0, 0, 0, 0, 0, 0, 0]);
        directory.set_device_online(1, 10, true);

        let provider = StateMessageProvider::resolve(&directory, 1, 10, 1);
        assert_eq!(names(provider.fields()), vec!["connected", "hi"]);
        let message = provider.message_at_index(1, "supla").expect("hi");
        assert_eq!(message.topic, "supla/abc/devices/10/channels/1/state/hi");
        assert_eq!(message.payload, "true");
        assert_eq!(provider.fields()[0].payload, "true");
    }

    #[test]
    fn humidity_and_temperature_publish_both() {
        let directory = directory();
        let registry = directory.attach_device(1, 10).expect("registry");
        registry.add_channel(3, 0, ChannelType::Dht22, ChannelFunction::HumidityAndTemperature, 0, 0, 0);
        registry.set_value(3, &encode_temp_hum(21_500, 45_000));

        let provider = StateMessageProvider::resolve(&directory, 1, 10, 3);
        assert_eq!(names(provider.fields()), vec!["connected", "temperature", "humidity"]);
        assert_eq!(provider.fields()[1].payload, "21.5");
        assert_eq!(provider.fields()[2].payload, "45");
    }

    #[test]
    fn rgb_state_includes_color_in_hex() {
        let directory = directory();
        let registry = directory.attach_device(1, 10).expect("registry");
        registry.add_channel(4, 0, ChannelType::DimmerAndRgbLed, ChannelFunction::DimmerAndRgbLighting, 0, 0, 0);
        registry.set_value(4, &[40, 80, 0xCC, 0xBB, 0xAA, 0, 0, 0]);

        let provider = StateMessageProvider::resolve(&directory, 1, 10, 4);
        assert_eq!(
            names(provider.fields()),
            vec!["connected", "on", "brightness", "color", "color_brightness"]
        );
        assert_eq!(provider.fields()[3].payload, "0xAABBCC");
    }

    #[test]
    fn electricity_meter_publishes_phases() {
        let directory = directory();
        let registry = directory.attach_device(1, 10).expect("registry");
        registry.add_channel(5, 0, ChannelType::ElectricityMeter, ChannelFunction::ElectricityMeter, 0, 0, 0);
        let mut measurement = ElectricityMeasurement::default();
        measurement.phases[0].total_forward_active_energy = 1.5;
        measurement.phases[2].total_forward_active_energy = 2.0;
        registry.set_extended_value(5, measurement);

        let provider = StateMessageProvider::resolve(&directory, 1, 10, 5);
        assert_eq!(provider.fields().len(), 2 + 3 * 4);
        assert_eq!(provider.fields()[1].payload, "3.5");
        assert_eq!(provider.fields()[2].name, "phases/1/voltage");
    }

    #[test]
    fn unknown_user_yields_nothing() {
        let directory = directory();
        let provider = StateMessageProvider::resolve(&directory, 2, 10, 1);
        assert!(provider.message_at_index(0, "supla").is_none());
        assert!(provider.owner().is_none());
    }
}
