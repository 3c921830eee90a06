/// Topic strings for one device under the fixed
/// `iot/<site>/<room>/<device>/...` namespace. Downstream subscribers match
/// these literally, so the layout here is a wire contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTopics {
    base: String,
}

impl DeviceTopics {
    pub fn new(site: &str, room: &str, device: &str) -> Self {
        Self {
            base: format!("iot/{site}/{room}/{device}"),
        }
    }

    pub fn bme688(&self) -> String {
        format!("{}/telemetry/bme688", self.base)
    }

    pub fn sps30(&self) -> String {
        format!("{}/telemetry/sps30", self.base)
    }

    pub fn dp(&self, channel: u32) -> String {
        format!("{}/telemetry/dp/{channel}", self.base)
    }

    pub fn status(&self) -> String {
        format!("{}/status", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_match_documented_namespace() {
        let topics = DeviceTopics::new("home1", "lab", "pico2w-01");
        assert_eq!(topics.bme688(), "iot/home1/lab/pico2w-01/telemetry/bme688");
        assert_eq!(topics.sps30(), "iot/home1/lab/pico2w-01/telemetry/sps30");
        assert_eq!(topics.dp(2), "iot/home1/lab/pico2w-01/telemetry/dp/2");
        assert_eq!(topics.status(), "iot/home1/lab/pico2w-01/status");
    }

    #[test]
    fn channel_number_is_literal() {
        let topics = DeviceTopics::new("site", "room", "dev");
        assert_eq!(topics.dp(10), "iot/site/room/dev/telemetry/dp/10");
    }
}
