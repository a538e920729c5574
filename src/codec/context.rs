use crate::codec::prototype_index::PrototypeIndex;
use crate::codec::types::Version;
use crate::error::Result;

/// Decode-time configuration and the currently-active prototype index and
/// version, threaded explicitly through every decoder call.
///
/// The source this format was distilled from threads a process-wide
/// "current version" global through nested decoders; SPEC_FULL.md §9
/// calls for replacing that with an explicit context value instead, with
/// scoped push/pop when a nested object (a blueprint inside a library, or a
/// blueprint with its own local prototype index) carries its own version.
pub struct DecodeContext<'a> {
    pub version: Version,
    pub skip_bad: bool,
    pub extended: bool,
    pub prototypes: &'a PrototypeIndex,
    /// Count of blueprint slots skipped under `skip_bad`, shared across every
    /// scoped copy of this context (see [`DecodeContext::with_version`] and
    /// [`DecodeContext::with_prototypes`]) so nested blueprint-books report
    /// to the same counter the library decoder reads at the end (SPEC_FULL.md
    /// §6 "CLI exit codes").
    pub skips: std::rc::Rc<std::cell::Cell<u32>>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(version: Version, skip_bad: bool, extended: bool, prototypes: &'a PrototypeIndex) -> Self {
        Self {
            version,
            skip_bad,
            extended,
            prototypes,
            skips: std::rc::Rc::new(std::cell::Cell::new(0)),
        }
    }

    /// Records one skipped blueprint slot.
    pub fn record_skip(&self) {
        self.skips.set(self.skips.get() + 1);
    }

    pub fn at_least(&self, gate: Version) -> bool {
        self.version >= gate
    }

    /// Runs `f` with `self.version` temporarily replaced by `version`,
    /// restoring the previous value on every exit path (including `f`
    /// returning an error).
    pub fn with_version<R>(
        &mut self,
        version: Version,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let saved = self.version;
        self.version = version;
        let result = f(self);
        self.version = saved;
        result
    }

    /// Runs `f` against a fresh context pointing at `prototypes` instead of
    /// `self.prototypes`, leaving `self` untouched. Used when a blueprint
    /// was saved with its own local prototype index (removed-mod support,
    /// SPEC_FULL.md §4.E). Takes a fresh lifetime rather than reusing `'a`
    /// so a locally-owned index (scoped to one blueprint's decode) can be
    /// swapped in without outliving its owner.
    pub fn with_prototypes<'b, R>(
        &self,
        prototypes: &'b PrototypeIndex,
        f: impl FnOnce(&mut DecodeContext<'b>) -> Result<R>,
    ) -> Result<R> {
        let mut scoped = DecodeContext {
            version: self.version,
            skip_bad: self.skip_bad,
            extended: self.extended,
            prototypes,
            skips: self.skips.clone(),
        };
        f(&mut scoped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_version_restores_on_success_and_error() {
        let protos = PrototypeIndex::new();
        let mut ctx = DecodeContext::new(Version::new(1, 0, 0, 0), false, false, &protos);

        ctx.with_version(Version::new(2, 0, 0, 0), |inner| {
            assert_eq!(inner.version, Version::new(2, 0, 0, 0));
            Ok(())
        })
        .unwrap();
        assert_eq!(ctx.version, Version::new(1, 0, 0, 0));

        let _: Result<()> = ctx.with_version(Version::new(3, 0, 0, 0), |inner| {
            assert_eq!(inner.version, Version::new(3, 0, 0, 0));
            Err(crate::error::ParseError::custom(0, "boom"))
        });
        assert_eq!(ctx.version, Version::new(1, 0, 0, 0));
    }

    #[test]
    fn with_prototypes_swaps_index_without_touching_original() {
        use crate::codec::prototype_index::Kind;

        let mut global = PrototypeIndex::new();
        global.add(0, Kind::Item, 1, "item", "iron-plate".into()).unwrap();

        let mut local = PrototypeIndex::new();
        local.add(0, Kind::Item, 1, "item", "renamed-iron-plate".into()).unwrap();

        let ctx = DecodeContext::new(Version::new(1, 0, 0, 0), false, false, &global);

        let seen = ctx
            .with_prototypes(&local, |scoped| Ok(scoped.prototypes.item_name(1).map(str::to_string)))
            .unwrap();
        assert_eq!(seen.as_deref(), Some("renamed-iron-plate"));
        assert_eq!(ctx.prototypes.item_name(1), Some("iron-plate"));
    }

    #[test]
    fn record_skip_is_shared_across_scoped_contexts() {
        let protos = PrototypeIndex::new();
        let ctx = DecodeContext::new(Version::new(1, 0, 0, 0), true, false, &protos);
        let other = PrototypeIndex::new();
        ctx.with_prototypes(&other, |scoped| {
            scoped.record_skip();
            Ok(())
        })
        .unwrap();
        assert_eq!(ctx.skips.get(), 1);
    }
}
