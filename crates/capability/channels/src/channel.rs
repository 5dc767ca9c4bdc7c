//! 单个设备通道。

use domain::value::{self, RawValue};
use domain::{
    ChannelFunction, ChannelId, ChannelType, ElectricityMeasurement, RgbwValue, TempHum,
};

/// 设备通道：身份、类型、功能、三个参数与 8 字节原始值。
///
/// 只能由 `ChannelRegistry` 创建和修改；对外暴露的都是拷贝。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceChannel {
    id: ChannelId,
    number: i32,
    channel_type: ChannelType,
    function: ChannelFunction,
    params: [i32; 3],
    value: RawValue,
    extended: Option<ElectricityMeasurement>,
}

impl DeviceChannel {
    pub(crate) fn new(
        id: ChannelId,
        number: i32,
        channel_type: ChannelType,
        function: ChannelFunction,
        params: [i32; 3],
    ) -> Self {
        Self {
            id,
            number,
            channel_type,
            function,
            params,
            value: value::initial_value(channel_type),
            extended: None,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    pub fn function(&self) -> ChannelFunction {
        self.function
    }

    pub fn param1(&self) -> i32 {
        self.params[0]
    }

    pub fn param2(&self) -> i32 {
        self.params[1]
    }

    pub fn param3(&self) -> i32 {
        self.params[2]
    }

    pub fn value(&self) -> RawValue {
        self.value
    }

    pub fn extended_value(&self) -> Option<&ElectricityMeasurement> {
        self.extended.as_ref()
    }

    pub fn double_value(&self) -> f64 {
        value::decode_double(self.channel_type, &self.value)
    }

    pub fn char_value(&self) -> u8 {
        value::decode_char(&self.value)
    }

    pub fn rgbw_value(&self) -> Option<RgbwValue> {
        value::decode_rgbw(self.channel_type, &self.value)
    }

    pub fn temp_hum(&self) -> Option<TempHum> {
        value::decode_temp_hum(self.id, self.channel_type, self.function, &self.value)
    }

    pub fn is_value_writable(&self) -> bool {
        self.function.is_value_writable()
    }

    pub fn is_char_value_writable(&self) -> bool {
        self.function.is_char_value_writable()
    }

    pub fn is_rgbw_value_writable(&self) -> bool {
        self.function.is_rgbw_value_writable()
    }

    /// 定时执行器的自动回弹时长（毫秒），其余功能为 0。
    pub fn value_duration_ms(&self) -> u32 {
        if self.function.is_timed_actuator() {
            u32::try_from(self.param1()).unwrap_or(0)
        } else {
            0
        }
    }

    /// 执行器关联的开合传感器通道。
    pub fn slave_channel(&self) -> Option<ChannelId> {
        if self.function.is_timed_actuator() {
            linked(self.param2())
        } else {
            None
        }
    }

    /// 开合传感器关联的执行器通道。
    pub fn master_channel(&self) -> Option<ChannelId> {
        if self.function.is_paired_opening_sensor() {
            linked(self.param1())
        } else {
            None
        }
    }

    pub(crate) fn set_value(&mut self, reported: &RawValue) {
        self.value = value::store_reported(self.channel_type, reported);
    }

    pub(crate) fn set_extended_value(&mut self, measurement: ElectricityMeasurement) {
        self.extended = Some(measurement);
    }

    pub(crate) fn assign_char_value(&self, char_value: u8) -> RawValue {
        value::assign_char(&self.value, char_value)
    }

    pub(crate) fn assign_rgbw_value(&self, rgbw: RgbwValue) -> RawValue {
        value::assign_rgbw(self.function, rgbw)
    }
}

fn linked(param: i32) -> Option<ChannelId> {
    (param != 0).then_some(param)
}
