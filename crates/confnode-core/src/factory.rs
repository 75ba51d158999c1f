//! Turning object configs into live domain objects

use crate::model::ConfigNode;
use crate::registry::{downcast_instance, Instance, TargetType, TypeRegistry};
use crate::tag::ConfigTag;
use crate::{Error, Result};

/// Builds the domain objects named by object configs.
#[derive(Debug, Clone, Copy)]
pub struct ObjectFactory<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> ObjectFactory<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Construct the `target_class` of `config`, passing the whole config as
    /// the single argument `config`.
    ///
    /// # Errors
    ///
    /// - `SchemaValidation` if `config` is not an object config
    /// - `TypeResolution` if `target_class` is not a registered target type
    /// - `TypeConstruction` if the domain constructor fails
    pub fn instantiate(&self, config: impl Into<ConfigNode>) -> Result<Instance> {
        let config = config.into();
        self.resolve_target_type(&config)?.construct(&config)
    }

    /// Like [`ObjectFactory::instantiate`], downcasting the instance to `T`.
    ///
    /// `T` may be a trait object such as `Box<dyn Behavior>` when the target
    /// type's constructor returns one.
    pub fn instantiate_as<T: 'static>(&self, config: impl Into<ConfigNode>) -> Result<T> {
        let config = config.into();
        let instance = self.instantiate(config.clone())?;
        downcast_instance(target_class_of(&config)?, instance)
    }

    /// The target type of `config`, without constructing it.
    pub fn resolve_target_type(&self, config: &ConfigNode) -> Result<&'r TargetType> {
        self.registry.resolve_target(target_class_of(config)?)
    }
}

fn target_class_of(config: &ConfigNode) -> Result<&str> {
    match (config.tag(), config.target_class()) {
        (ConfigTag::Object, Some(target_class)) => Ok(target_class),
        (tag, _) => Err(Error::NotAnObjectConfig {
            config_class: config.config_class().to_string(),
            tag: tag.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConfigMeta, ConfigRecord};
    use crate::params::Params;
    use crate::ErrorKind;
    use std::sync::Arc;

    #[derive(Debug)]
    struct MotorConfig {
        meta: ConfigMeta,
        rpm: u32,
    }

    impl ConfigRecord for MotorConfig {
        const TAG: ConfigTag = ConfigTag::Object;

        fn meta(&self) -> &ConfigMeta {
            &self.meta
        }

        fn from_params(meta: ConfigMeta, params: &mut Params) -> Result<Self> {
            Ok(Self {
                meta,
                rpm: params.required("rpm")?,
            })
        }

        fn to_params(&self) -> Params {
            Params::new().with("rpm", self.rpm)
        }
    }

    #[derive(Debug)]
    struct NoteConfig {
        meta: ConfigMeta,
    }

    impl ConfigRecord for NoteConfig {
        const TAG: ConfigTag = ConfigTag::Simple;

        fn meta(&self) -> &ConfigMeta {
            &self.meta
        }

        fn from_params(meta: ConfigMeta, _params: &mut Params) -> Result<Self> {
            Ok(Self { meta })
        }

        fn to_params(&self) -> Params {
            Params::new()
        }
    }

    #[derive(Debug, PartialEq)]
    struct Motor {
        rpm: u32,
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register_target(
                "plant.Motor",
                TargetType::new(|c: &MotorConfig| {
                    if c.rpm == 0 {
                        return Err("a motor needs a non-zero rpm".to_string());
                    }
                    Ok(Motor { rpm: c.rpm })
                }),
            )
            .unwrap();
        registry
    }

    fn motor(rpm: u32, target: &str) -> Arc<MotorConfig> {
        Arc::new(MotorConfig {
            meta: ConfigMeta::object("plant.MotorConfig", target),
            rpm,
        })
    }

    #[test]
    fn instantiate_builds_the_target() {
        let registry = registry();
        let factory = ObjectFactory::new(&registry);

        let built: Motor = factory.instantiate_as(motor(1200, "plant.Motor")).unwrap();

        assert_eq!(built, Motor { rpm: 1200 });
    }

    #[test]
    fn constructor_failures_keep_their_cause() {
        let registry = registry();
        let err = ObjectFactory::new(&registry)
            .instantiate(motor(0, "plant.Motor"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TypeConstruction);
        let cause = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("a motor needs a non-zero rpm"));
    }

    #[test]
    fn unknown_target_is_a_resolution_error() {
        let registry = registry();
        let err = ObjectFactory::new(&registry)
            .instantiate(motor(10, "plant.Pump"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeResolution);
        assert!(err.to_string().contains("plant.Pump"));
    }

    #[test]
    fn non_object_configs_are_rejected() {
        let registry = registry();
        let note = ConfigNode::new(NoteConfig {
            meta: ConfigMeta::new(ConfigTag::Simple, "plant.Note"),
        });

        let err = ObjectFactory::new(&registry).instantiate(note.clone()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
        assert!(matches!(err, Error::NotAnObjectConfig { .. }));
        assert!(ObjectFactory::new(&registry).resolve_target_type(&note).is_err());
    }

    #[test]
    fn wrong_instance_type_is_a_construction_error() {
        let registry = registry();
        let err = ObjectFactory::new(&registry)
            .instantiate_as::<String>(motor(5, "plant.Motor"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeConstruction);
    }

    #[test]
    fn resolve_target_type_does_not_construct() {
        let registry = registry();
        let target = ObjectFactory::new(&registry)
            .resolve_target_type(&ConfigNode::from(motor(0, "plant.Motor")))
            .unwrap();
        assert_eq!(target.name(), "plant.Motor");
    }
}
