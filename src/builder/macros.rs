//! Macros for ergonomic state declaration.

/// Declare a state enum and its State trait implementation.
///
/// `final:` names the sentinel that ends the dispatch loop; `invalid:`
/// optionally names the sentinel refused as an initial state.
///
/// # Example
///
/// ```
/// use evented_sm::state_enum;
/// use evented_sm::core::State;
///
/// state_enum! {
///     pub enum RxState {
///         Invalid,
///         Setup,
///         WaitingForSync,
///         SyncedRx,
///         Done,
///     }
///     final: Done
///     invalid: Invalid
/// }
///
/// assert!(RxState::Done.is_final());
/// assert!(RxState::Invalid.is_invalid());
/// assert_eq!(RxState::WaitingForSync.name(), "WaitingForSync");
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        final: $final:ident
        $(invalid: $invalid:ident)?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            fn final_state() -> Self {
                Self::$final
            }

            #[allow(unreachable_patterns)]
            fn is_invalid(&self) -> bool {
                match self {
                    $(Self::$invalid => true,)?
                    _ => false,
                }
            }
        }
    };
}
