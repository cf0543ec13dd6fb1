use bitflags::bitflags;

bitflags! {
    /// Optional hooks a config type opts into.
    ///
    /// Read once when the type is registered; the manager never probes the instance per call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Run `on_before_serialize` right before encoding.
        const BEFORE_SERIALIZE = 1;
        /// Run `on_after_deserialize` right after decoding.
        const AFTER_DESERIALIZE = 1 << 1;
        /// Run the async self-validation hook.
        const CHECK_CORRECTNESS = 1 << 2;
    }
}
