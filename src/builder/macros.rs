//! Macros for declaring trigger enums.

/// Declare a fieldless enum usable as a state machine trigger.
///
/// Generates the enum with the derives a trigger needs, the
/// [`Trigger`](crate::core::Trigger) implementation, and an `ALL` constant
/// listing every variant in declaration order.
///
/// # Example
///
/// ```
/// use switchyard::trigger_enum;
/// use switchyard::core::Trigger;
///
/// trigger_enum! {
///     pub enum GameFlow {
///         Boot,
///         Menu,
///         Playing,
///     }
/// }
///
/// assert_eq!(GameFlow::Menu.name(), "Menu");
/// assert_eq!(GameFlow::ALL.len(), 3);
/// ```
#[macro_export]
macro_rules! trigger_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            #[allow(dead_code)]
            pub const ALL: &'static [$name] = &[$($name::$variant),*];
        }

        impl $crate::core::Trigger for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::Trigger;

    trigger_enum! {
        enum TestFlow {
            Idle,
            Loading,
            Ready,
        }
    }

    #[test]
    fn trigger_enum_macro_generates_trait() {
        assert_eq!(TestFlow::Idle.name(), "Idle");
        assert_eq!(TestFlow::Ready.name(), "Ready");
    }

    #[test]
    fn all_lists_variants_in_order() {
        assert_eq!(
            TestFlow::ALL,
            &[TestFlow::Idle, TestFlow::Loading, TestFlow::Ready]
        );
    }

    #[test]
    fn trigger_enum_supports_visibility_and_attributes() {
        trigger_enum! {
            /// Screens of the options menu.
            pub enum PublicFlow {
                #[allow(dead_code)]
                A,
                B,
            }
        }

        assert_eq!(PublicFlow::B.name(), "B");
    }

    #[test]
    fn trigger_serializes_by_name() {
        let json = serde_json::to_string(&TestFlow::Loading).unwrap();
        assert_eq!(json, "\"Loading\"");
    }
}
