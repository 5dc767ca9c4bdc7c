//! 通道类型与通道功能。
//!
//! 类型描述物理硬件（继电器、DHT22、RGB 控制器……），功能描述用户为通道
//! 指定的行为角色（开门、照明、测温……），两者相互独立。

/// 用户标识。
pub type UserId = i32;
/// 设备标识（全局唯一）。
pub type DeviceId = i32;
/// 通道标识（全局唯一）。
pub type ChannelId = i32;

/// 通道物理类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    SensorNo,
    SensorNc,
    DistanceSensor,
    CallButton,
    Relay,
    ThermometerDs18b20,
    Dht11,
    Dht22,
    Dht21,
    Am2302,
    Am2301,
    Dimmer,
    RgbLedController,
    DimmerAndRgbLed,
    ElectricityMeter,
    Other(i32),
}

impl ChannelType {
    pub fn from_code(code: i32) -> Self {
        match code {
            1000 => Self::SensorNo,
            1010 => Self::SensorNc,
            1020 => Self::DistanceSensor,
            1500 => Self::CallButton,
            2900 => Self::Relay,
            3000 => Self::ThermometerDs18b20,
            3010 => Self::Dht11,
            3020 => Self::Dht22,
            3022 => Self::Dht21,
            3030 => Self::Am2302,
            3032 => Self::Am2301,
            4000 => Self::Dimmer,
            4010 => Self::RgbLedController,
            4020 => Self::DimmerAndRgbLed,
            5000 => Self::ElectricityMeter,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::SensorNo => 1000,
            Self::SensorNc => 1010,
            Self::DistanceSensor => 1020,
            Self::CallButton => 1500,
            Self::Relay => 2900,
            Self::ThermometerDs18b20 => 3000,
            Self::Dht11 => 3010,
            Self::Dht22 => 3020,
            Self::Dht21 => 3022,
            Self::Am2302 => 3030,
            Self::Am2301 => 3032,
            Self::Dimmer => 4000,
            Self::RgbLedController => 4010,
            Self::DimmerAndRgbLed => 4020,
            Self::ElectricityMeter => 5000,
            Self::Other(code) => code,
        }
    }

    /// MQTT `type` 主题使用的名称。
    pub fn name(self) -> &'static str {
        match self {
            Self::SensorNo => "SENSORNO",
            Self::SensorNc => "SENSORNC",
            Self::DistanceSensor => "DISTANCESENSOR",
            Self::CallButton => "CALLBUTTON",
            Self::Relay => "RELAY",
            Self::ThermometerDs18b20 => "THERMOMETERDS18B20",
            Self::Dht11 => "DHT11",
            Self::Dht22 => "DHT22",
            Self::Dht21 => "DHT21",
            Self::Am2302 => "AM2302",
            Self::Am2301 => "AM2301",
            Self::Dimmer => "DIMMER",
            Self::RgbLedController => "RGBLEDCONTROLLER",
            Self::DimmerAndRgbLed => "DIMMERANDRGBLED",
            Self::ElectricityMeter => "ELECTRICITYMETER",
            Self::Other(_) => "UNKNOWN",
        }
    }

    pub fn is_binary_sensor(self) -> bool {
        matches!(self, Self::SensorNo | Self::SensorNc)
    }

    /// 温湿度一体传感器（缓冲区为两个 ×1000 的小端 i32）。
    pub fn is_temp_hum_sensor(self) -> bool {
        matches!(
            self,
            Self::Dht11 | Self::Dht22 | Self::Dht21 | Self::Am2301 | Self::Am2302
        )
    }

    pub fn has_brightness(self) -> bool {
        matches!(self, Self::Dimmer | Self::DimmerAndRgbLed)
    }

    pub fn has_color(self) -> bool {
        matches!(self, Self::RgbLedController | Self::DimmerAndRgbLed)
    }
}

/// 通道功能。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelFunction {
    None,
    ControllingTheGatewayLock,
    ControllingTheGate,
    ControllingTheGarageDoor,
    Thermometer,
    Humidity,
    HumidityAndTemperature,
    OpeningSensorGateway,
    OpeningSensorGate,
    OpeningSensorGarageDoor,
    NoLiquidSensor,
    ControllingTheDoorLock,
    OpeningSensorDoor,
    ControllingTheRollerShutter,
    OpeningSensorRollerShutter,
    PowerSwitch,
    LightSwitch,
    Dimmer,
    RgbLighting,
    DimmerAndRgbLighting,
    DepthSensor,
    DistanceSensor,
    OpeningSensorWindow,
    MailSensor,
    StaircaseTimer,
    ElectricityMeter,
    Other(i32),
}

impl ChannelFunction {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::None,
            10 => Self::ControllingTheGatewayLock,
            20 => Self::ControllingTheGate,
            30 => Self::ControllingTheGarageDoor,
            40 => Self::Thermometer,
            42 => Self::Humidity,
            45 => Self::HumidityAndTemperature,
            50 => Self::OpeningSensorGateway,
            60 => Self::OpeningSensorGate,
            70 => Self::OpeningSensorGarageDoor,
            80 => Self::NoLiquidSensor,
            90 => Self::ControllingTheDoorLock,
            100 => Self::OpeningSensorDoor,
            110 => Self::ControllingTheRollerShutter,
            120 => Self::OpeningSensorRollerShutter,
            130 => Self::PowerSwitch,
            140 => Self::LightSwitch,
            180 => Self::Dimmer,
            190 => Self::RgbLighting,
            200 => Self::DimmerAndRgbLighting,
            210 => Self::DepthSensor,
            220 => Self::DistanceSensor,
            230 => Self::OpeningSensorWindow,
            240 => Self::MailSensor,
            300 => Self::StaircaseTimer,
            310 => Self::ElectricityMeter,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::ControllingTheGatewayLock => 10,
            Self::ControllingTheGate => 20,
            Self::ControllingTheGarageDoor => 30,
            Self::Thermometer => 40,
            Self::Humidity => 42,
            Self::HumidityAndTemperature => 45,
            Self::OpeningSensorGateway => 50,
            Self::OpeningSensorGate => 60,
            Self::OpeningSensorGarageDoor => 70,
            Self::NoLiquidSensor => 80,
            Self::ControllingTheDoorLock => 90,
            Self::OpeningSensorDoor => 100,
            Self::ControllingTheRollerShutter => 110,
            Self::OpeningSensorRollerShutter => 120,
            Self::PowerSwitch => 130,
            Self::LightSwitch => 140,
            Self::Dimmer => 180,
            Self::RgbLighting => 190,
            Self::DimmerAndRgbLighting => 200,
            Self::DepthSensor => 210,
            Self::DistanceSensor => 220,
            Self::OpeningSensorWindow => 230,
            Self::MailSensor => 240,
            Self::StaircaseTimer => 300,
            Self::ElectricityMeter => 310,
            Self::Other(code) => code,
        }
    }

    /// MQTT `function` 主题使用的名称。
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::ControllingTheGatewayLock => "CONTROLLINGTHEGATEWAYLOCK",
            Self::ControllingTheGate => "CONTROLLINGTHEGATE",
            Self::ControllingTheGarageDoor => "CONTROLLINGTHEGARAGEDOOR",
            Self::Thermometer => "THERMOMETER",
            Self::Humidity => "HUMIDITY",
            Self::HumidityAndTemperature => "HUMIDITYANDTEMPERATURE",
            Self::OpeningSensorGateway => "OPENINGSENSOR_GATEWAY",
            Self::OpeningSensorGate => "OPENINGSENSOR_GATE",
            Self::OpeningSensorGarageDoor => "OPENINGSENSOR_GARAGEDOOR",
            Self::NoLiquidSensor => "NOLIQUIDSENSOR",
            Self::ControllingTheDoorLock => "CONTROLLINGTHEDOORLOCK",
            Self::OpeningSensorDoor => "OPENINGSENSOR_DOOR",
            Self::ControllingTheRollerShutter => "CONTROLLINGTHEROLLERSHUTTER",
            Self::OpeningSensorRollerShutter => "OPENINGSENSOR_ROLLERSHUTTER",
            Self::PowerSwitch => "POWERSWITCH",
            Self::LightSwitch => "LIGHTSWITCH",
            Self::Dimmer => "DIMMER",
            Self::RgbLighting => "RGBLIGHTING",
            Self::DimmerAndRgbLighting => "DIMMERANDRGBLIGHTING",
            Self::DepthSensor => "DEPTHSENSOR",
            Self::DistanceSensor => "DISTANCESENSOR",
            Self::OpeningSensorWindow => "OPENINGSENSOR_WINDOW",
            Self::MailSensor => "MAILSENSOR",
            Self::StaircaseTimer => "STAIRCASETIMER",
            Self::ElectricityMeter => "ELECTRICITYMETER",
            Self::Other(_) => "UNSUPPORTED",
        }
    }

    /// 通用写入白名单。
    pub fn is_value_writable(self) -> bool {
        self.is_char_value_writable() || self.is_rgbw_value_writable()
    }

    /// 单字节写入白名单。
    pub fn is_char_value_writable(self) -> bool {
        matches!(
            self,
            Self::ControllingTheGatewayLock
                | Self::ControllingTheGate
                | Self::ControllingTheGarageDoor
                | Self::ControllingTheDoorLock
                | Self::ControllingTheRollerShutter
                | Self::PowerSwitch
                | Self::LightSwitch
        )
    }

    /// RGBW 写入白名单。
    pub fn is_rgbw_value_writable(self) -> bool {
        matches!(
            self,
            Self::Dimmer | Self::RgbLighting | Self::DimmerAndRgbLighting
        )
    }

    /// 定时执行器：写入后经 `Param1` 毫秒自动回弹。
    pub fn is_timed_actuator(self) -> bool {
        matches!(
            self,
            Self::ControllingTheGatewayLock
                | Self::ControllingTheGate
                | Self::ControllingTheGarageDoor
                | Self::ControllingTheDoorLock
                | Self::ControllingTheRollerShutter
        )
    }

    /// 与定时执行器配对的开合传感器。
    pub fn is_paired_opening_sensor(self) -> bool {
        matches!(
            self,
            Self::OpeningSensorGateway
                | Self::OpeningSensorGate
                | Self::OpeningSensorGarageDoor
                | Self::OpeningSensorDoor
                | Self::OpeningSensorRollerShutter
        )
    }

    pub fn writes_brightness(self) -> bool {
        matches!(self, Self::Dimmer | Self::DimmerAndRgbLighting)
    }

    pub fn writes_color(self) -> bool {
        matches!(self, Self::RgbLighting | Self::DimmerAndRgbLighting)
    }
}
