pub mod instance_types {
    pub const ML_M5_LARGE: &str = "ml.m5.large";
    pub const ML_M5_XLARGE: &str = "ml.m5.xlarge";
    pub const ML_M5_2XLARGE: &str = "ml.m5.2xlarge";
    pub const ML_M5_4XLARGE: &str = "ml.m5.4xlarge";
    pub const ML_P3_2XLARGE: &str = "ml.p3.2xlarge";
    pub const ML_G5_XLARGE: &str = "ml.g5.xlarge";
}

pub mod defaults {
    use super::instance_types::ML_M5_4XLARGE;

    pub const REGION: &str = "us-east-1";
    pub const INSTANCE_TYPE: &str = ML_M5_4XLARGE;

    pub const VOLUME_SIZE_GB: u32 = 30;
    /// 24 hours.
    pub const MAX_RUN_SECONDS: u32 = 24 * 60 * 60;
    pub const MAX_WAIT_SECONDS: u32 = MAX_RUN_SECONDS + 1;

    pub const USE_SPOT_INSTANCES: bool = true;
    pub const USE_NETWORK_ISOLATION: bool = false;
}

/// Multi-node training is not supported, every job runs on a single instance.
pub const INSTANCE_COUNT: u32 = 1;

/// Prefix under the artifact bucket where job output is written.
pub const OUTPUT_PREFIX: &str = "output";
