/// 电表单相测量值。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseMeasurement {
    pub voltage: f64,
    pub current: f64,
    pub power_active: f64,
    pub total_forward_active_energy: f64,
}

/// 电表扩展值（三相）。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElectricityMeasurement {
    pub phases: [PhaseMeasurement; 3],
}

impl ElectricityMeasurement {
    /// 三相正向有功电能之和。
    pub fn total_forward_active_energy(&self) -> f64 {
        self.phases
            .iter()
            .map(|phase| phase.total_forward_active_energy)
            .sum()
    }
}
