use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct WatchOptions: u8 {
        /// Call the callback once with the current value when the watcher is
        /// installed.
        const IMMEDIATE = 1 << 0;
    }
}
