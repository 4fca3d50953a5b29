pub mod add;
pub mod anchor;
pub mod create;
pub mod extract;
pub mod info;
pub mod keygen;
pub mod list;
pub mod seal;
pub mod verify;

/// Global context passed to all commands.
pub struct Context {
    pub json: bool,
}
