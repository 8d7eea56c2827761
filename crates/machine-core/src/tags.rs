#[derive(Debug, Clone, Copy)]
pub struct Tag {
    pub key: &'static str,
    pub metric: &'static str,
    pub unit: &'static str,
}

pub const TEMPERATURE_C: Tag = Tag {
    key: "temperature",
    metric: "machine_temperature_celsius",
    unit: "°C",
};

pub const VOLTAGE_V: Tag = Tag {
    key: "voltage",
    metric: "machine_voltage_volts",
    unit: "V",
};

pub const SPEED_RPM: Tag = Tag {
    key: "speed",
    metric: "machine_speed_rpm",
    unit: "RPM",
};

pub const STATE_CODE: Tag = Tag {
    key: "state",
    metric: "machine_state_code",
    unit: "",
};

pub const OVERHEAT_TICKS: Tag = Tag {
    key: "overheat_ticks",
    metric: "machine_overheat_ticks",
    unit: "ticks",
};

pub const TICKS: Tag = Tag {
    key: "tick",
    metric: "machine_ticks_total",
    unit: "ticks",
};
