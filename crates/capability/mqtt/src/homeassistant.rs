//! Home Assistant 自动发现配置。
//!
//! 主题：`homeassistant/<component>/<haSuid>/<channelId[_subindex]>/config`，
//! 负载为 JSON。`haSuid` 见 [`ha_suid`]。每种通道功能对应零到多条配置，按下标寻址。

use crate::error::MqttError;
use crate::message::{MqttMessage, ha_suid};
use domain::ChannelFunction;
use hub_storage::ChannelRow;
use serde::Serialize;

/// 一条发现配置的静态描述。
#[derive(Debug, Clone, Copy)]
struct Discovery {
    component: &'static str,
    /// 同一通道有多条配置时的子下标。
    subindex: Option<u8>,
    state_field: Option<&'static str>,
    command_topic: bool,
    device_class: Option<&'static str>,
    unit: Option<&'static str>,
    binary: bool,
}

const fn discovery(component: &'static str) -> Discovery {
    Discovery {
        component,
        subindex: None,
        state_field: None,
        command_topic: false,
        device_class: None,
        unit: None,
        binary: false,
    }
}

const SWITCH: Discovery = Discovery {
    state_field: Some("on"),
    command_topic: true,
    binary: true,
    ..discovery("switch")
};

const LIGHT: Discovery = Discovery {
    state_field: Some("on"),
    command_topic: true,
    binary: true,
    ..discovery("light")
};

const fn opening(device_class: &'static str) -> Discovery {
    Discovery {
        state_field: Some("hi"),
        device_class: Some(device_class),
        binary: true,
        ..discovery("binary_sensor")
    }
}

const fn sensor(
    subindex: Option<u8>,
    state_field: &'static str,
    device_class: &'static str,
    unit: &'static str,
) -> Discovery {
    Discovery {
        subindex,
        state_field: Some(state_field),
        device_class: Some(device_class),
        unit: Some(unit),
        ..discovery("sensor")
    }
}

const COVER: Discovery = Discovery {
    state_field: Some("shut"),
    command_topic: true,
    device_class: Some("shutter"),
    ..discovery("cover")
};

const BUTTON: Discovery = Discovery {
    command_topic: true,
    ..discovery("button")
};

const TEMPERATURE: Discovery = sensor(None, "temperature", "temperature", "°C");
const HUMIDITY: Discovery = sensor(None, "humidity", "humidity", "%");

fn discoveries(function: ChannelFunction) -> &'static [Discovery] {
    match function {
        ChannelFunction::PowerSwitch | ChannelFunction::StaircaseTimer => &[SWITCH],
        ChannelFunction::LightSwitch
        | ChannelFunction::Dimmer
        | ChannelFunction::RgbLighting
        | ChannelFunction::DimmerAndRgbLighting => &[LIGHT],
        ChannelFunction::OpeningSensorGateway | ChannelFunction::OpeningSensorGate => {
            const GATE: [Discovery; 1] = [opening("opening")];
            &GATE
        }
        ChannelFunction::OpeningSensorGarageDoor => {
            const GARAGE: [Discovery; 1] = [opening("garage_door")];
            &GARAGE
        }
        ChannelFunction::OpeningSensorDoor => {
            const DOOR: [Discovery; 1] = [opening("door")];
            &DOOR
        }
        ChannelFunction::OpeningSensorRollerShutter | ChannelFunction::OpeningSensorWindow => {
            const WINDOW: [Discovery; 1] = [opening("window")];
            &WINDOW
        }
        ChannelFunction::Thermometer => &[TEMPERATURE],
        ChannelFunction::Humidity => &[HUMIDITY],
        ChannelFunction::HumidityAndTemperature => {
            const BOTH: [Discovery; 2] = [
                sensor(Some(0), "temperature", "temperature", "°C"),
                sensor(Some(1), "humidity", "humidity", "%"),
            ];
            &BOTH
        }
        ChannelFunction::DepthSensor => {
            const DEPTH: [Discovery; 1] = [sensor(None, "depth", "distance", "m")];
            &DEPTH
        }
        ChannelFunction::DistanceSensor => {
            const DISTANCE: [Discovery; 1] = [sensor(None, "distance", "distance", "m")];
            &DISTANCE
        }
        ChannelFunction::ElectricityMeter => {
            const ENERGY: [Discovery; 1] =
                [sensor(None, "total_forward_active_energy", "energy", "kWh")];
            &ENERGY
        }
        ChannelFunction::ControllingTheRollerShutter => &[COVER],
        ChannelFunction::ControllingTheGatewayLock
        | ChannelFunction::ControllingTheGate
        | ChannelFunction::ControllingTheGarageDoor
        | ChannelFunction::ControllingTheDoorLock => &[BUTTON],
        _ => &[],
    }
}

#[derive(Debug, Serialize)]
struct DiscoveryPayload<'a> {
    name: &'a str,
    unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_on: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_off: Option<&'static str>,
}

/// 通道行对应的发现配置条数。
pub fn config_count(row: &ChannelRow) -> usize {
    discoveries(row.function()).len()
}

/// 第 `index` 条发现配置；越界返回 `Ok(None)`。
pub fn config_at(
    row: &ChannelRow,
    index: usize,
    topic_prefix: &str,
) -> Result<Option<MqttMessage>, MqttError> {
    let function = row.function();
    let Some(entry) = discoveries(function).get(index) else {
        return Ok(None);
    };

    let object_id = match entry.subindex {
        Some(subindex) => format!("{}_{}", row.channel_id, subindex),
        None => row.channel_id.to_string(),
    };
    let channel_root = format!(
        "{}/{}/devices/{}/channels/{}",
        topic_prefix, row.user_suid, row.device_id, row.channel_id
    );
    let name = row
        .channel_caption
        .as_deref()
        .filter(|caption| !caption.is_empty())
        .unwrap_or_else(|| function.name());

    let payload = DiscoveryPayload {
        name,
        unique_id: format!("supla_{}", object_id),
        state_topic: entry
            .state_field
            .map(|field| format!("{}/state/{}", channel_root, field)),
        command_topic: entry
            .command_topic
            .then(|| format!("{}/execute_action", channel_root)),
        device_class: entry.device_class,
        unit_of_measurement: entry.unit,
        payload_on: entry.binary.then_some("true"),
        payload_off: entry.binary.then_some("false"),
    };
    let payload =
        serde_json::to_string(&payload).map_err(|err| MqttError::Payload(err.to_string()))?;

    Ok(Some(MqttMessage::new(
        format!(
            "homeassistant/{}/{}/{}/config",
            entry.component,
            ha_suid(&row.user_suid),
            object_id
        ),
        payload,
    )))
}
