//! Default configuration values

/// Default prefix prepended to every Debian source and package name
pub const DEFAULT_PREFIX: &str = "zj-humanoid";

/// Default target architecture
pub const DEFAULT_ARCH: &str = "all";

/// Architecture value for platform-independent packages
pub const ARCH_INDEPENDENT: &str = "all";

/// Default ROS distribution
pub const DEFAULT_ROS_DISTRO: &str = "noetic";

/// Default location of the run manifest
pub const DEFAULT_MANIFEST_PATH: &str = "/tmp/deb.json";

/// Directory (relative to the workspace) collecting built artifacts
pub const DEFAULT_DIST_DIR: &str = "dist";

/// Default control-file generator
pub const DEFAULT_GENERATOR: &str = "bloom-generate";

/// Default unprivileged-build wrapper
pub const DEFAULT_FAKEROOT: &str = "fakeroot";

/// Default OS package manager
pub const DEFAULT_PACKAGE_MANAGER: &str = "apt-get";

/// Default privilege escalation command
pub const DEFAULT_SUDO: &str = "sudo";

/// Environment variable marking a tagged-release run
pub const ENV_TAG_TRIGGER: &str = "IS_TAG_TRIGGER";

/// Environment variable selecting the ROS distribution
pub const ENV_ROS_DISTRO: &str = "ROS_DISTRO";

/// Environment variable overriding the manifest location
pub const ENV_MANIFEST_PATH: &str = "ROSDEB_MANIFEST";

/// Build directories left behind by previous runs
pub const STALE_BUILD_DIRS: &[&str] = &["debian", ".obj-x86_64-linux-gnu", "obj-x86_64-linux-gnu"];

/// File extensions of ROS interface definitions (messages, services, actions)
pub const INTERFACE_EXTENSIONS: &[&str] = &["msg", "srv", "action"];

/// Marker files that exclude a directory from workspace discovery
pub const IGNORE_MARKERS: &[&str] = &["CATKIN_IGNORE", "COLCON_IGNORE", "AMENT_IGNORE"];

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
