//! Driver registry.
//!
//! Provides a `DriverRegistry` struct for registering and retrieving driver
//! factories by name. Constructed at startup and passed by value; there is
//! no global registry.

use std::collections::HashMap;
use trav_common::hal::driver::{DriverFactory, HalError, RobotDriver};

/// Registry of available robot drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding all built-in drivers.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// Returns `HalError::DriverNotFound` if no driver with the given name is registered.
    pub fn create_driver(&self, name: &str) -> Result<Box<dyn RobotDriver>, HalError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| HalError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered driver names.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trav_common::config::TraverseConfig;
    use trav_common::hal::driver::{MotorActuator, SensorSource};
    use trav_common::hal::types::MotorCommand;

    struct TestDriver;

    impl SensorSource for TestDriver {
        fn read_heading(&self) -> f64 {
            0.0
        }

        fn read_lateral_distance(&self) -> f64 {
            0.0
        }

        fn read_forward_distance(&self) -> f64 {
            0.0
        }
    }

    impl MotorActuator for TestDriver {
        fn set_speeds(&mut self, _left: MotorCommand, _right: MotorCommand) {}
    }

    impl RobotDriver for TestDriver {
        fn name(&self) -> &'static str {
            "test"
        }

        fn version(&self) -> &'static str {
            "0.1.0"
        }

        fn init(&mut self, _config: &TraverseConfig) -> Result<(), HalError> {
            Ok(())
        }

        fn shutdown(&mut self) -> Result<(), HalError> {
            Ok(())
        }
    }

    fn create_test_driver() -> Box<dyn RobotDriver> {
        Box::new(TestDriver)
    }

    #[test]
    fn registry_register_and_create() {
        let mut reg = DriverRegistry::new();
        reg.register("test_driver", create_test_driver);

        let driver = reg.create_driver("test_driver").expect("should create");
        assert_eq!(driver.name(), "test");
    }

    #[test]
    fn registry_driver_not_found() {
        let reg = DriverRegistry::new();
        let result = reg.create_driver("nonexistent");
        assert!(matches!(result, Err(HalError::DriverNotFound(_))));
    }

    #[test]
    fn registry_builtin_has_simulation() {
        let reg = DriverRegistry::with_builtin_drivers();
        assert_eq!(reg.list_drivers(), vec!["simulation"]);
        let driver = reg.create_driver("simulation").expect("should create");
        assert_eq!(driver.name(), "simulation");
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = DriverRegistry::new();
        reg.register("dup", create_test_driver);
        reg.register("dup", create_test_driver);
    }
}
