/// Macro to declare an identifier enum that keeps its wire value
///
/// Generates the enum plus `ALL`, `wire()`, `from_wire()`, `name()`,
/// `Display` and `From<Enum> for repr`. Several members may share a wire
/// value; `from_wire` resolves to the first one declared.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $repr:ty {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every member in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Numeric value on the wire
            pub const fn wire(self) -> $repr {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            /// Resolve a wire value, `None` if no member carries it
            pub fn from_wire(value: $repr) -> Option<Self> {
                Self::ALL.iter().copied().find(|member| member.wire() == value)
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl From<$name> for $repr {
            fn from(value: $name) -> $repr {
                value.wire()
            }
        }

        impl TryFrom<$repr> for $name {
            type Error = $crate::UnknownWireValue;

            fn try_from(value: $repr) -> Result<Self, $crate::UnknownWireValue> {
                Self::from_wire(value).ok_or($crate::UnknownWireValue {
                    kind: stringify!($name),
                    value: i64::from(value),
                })
            }
        }
    };
}
