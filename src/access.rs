//! The access model (§4.1): wraps raw arguments with read/write intent and
//! describes compound accesses over named sub-regions.

use std::fmt;

use crate::error::{Error, Result};
use crate::identity::{TrackedValue, ValueId};
use crate::exec::TaskHandle;

/// A read/write intent pair. The four tags spec.md §3 names are exposed as
/// associated constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessTag {
    pub read: bool,
    pub write: bool,
}

impl AccessTag {
    pub const IGNORED: AccessTag = AccessTag { read: false, write: false };
    pub const IN: AccessTag = AccessTag { read: true, write: false };
    pub const OUT: AccessTag = AccessTag { read: false, write: true };
    pub const INOUT: AccessTag = AccessTag { read: true, write: true };
}

/// One `(sub-selector, tag)` entry of a compound access.
#[derive(Debug, Clone)]
pub struct SubAccess {
    pub selector: String,
    pub tag: AccessTag,
}

impl SubAccess {
    /// Builds a sub-access from a selector name and a tag constructor
    /// keyword (`"in"`, `"out"`, `"inout"`). Exists for callers that build
    /// `Deps` entries dynamically (e.g. from a config file or a macro)
    /// rather than through `sub_in`/`sub_out`/`sub_inout` directly; this is
    /// the one place spec.md §4.1's *InvalidAccess* failure is actually
    /// reachable, since `sub_in`/`sub_out`/`sub_inout` make the malformed
    /// state unrepresentable at the type level.
    pub fn parse(selector: impl Into<String>, kind: &str) -> Result<SubAccess> {
        let tag = match kind {
            "in" => AccessTag::IN,
            "out" => AccessTag::OUT,
            "inout" => AccessTag::INOUT,
            other => {
                return Err(Error::InvalidAccess(format!(
                    "`{other}` is not a tag constructor (expected `in`, `out`, or `inout`)"
                )))
            }
        };
        Ok(SubAccess { selector: selector.into(), tag })
    }
}

pub fn sub_in(selector: impl Into<String>) -> SubAccess {
    SubAccess { selector: selector.into(), tag: AccessTag::IN }
}

pub fn sub_out(selector: impl Into<String>) -> SubAccess {
    SubAccess { selector: selector.into(), tag: AccessTag::OUT }
}

pub fn sub_inout(selector: impl Into<String>) -> SubAccess {
    SubAccess { selector: selector.into(), tag: AccessTag::INOUT }
}

/// The value half of an access: either a plain value, or a compound value
/// paired with sub-accesses over named regions of it (`Deps`).
#[derive(Debug, Clone)]
pub enum Arg<V> {
    Value(V),
    Compound { base: V, subs: Vec<SubAccess> },
}

impl<V> From<V> for Arg<V> {
    fn from(v: V) -> Arg<V> {
        Arg::Value(v)
    }
}

impl<V> Arg<V> {
    fn base(&self) -> &V {
        match self {
            Arg::Value(v) => v,
            Arg::Compound { base, .. } => base,
        }
    }

    fn subs(&self) -> &[SubAccess] {
        match self {
            Arg::Value(_) => &[],
            Arg::Compound { subs, .. } => subs,
        }
    }
}

/// `Deps(x, d1, .., dn)`: a compound access over a base value.
pub fn deps<V>(base: V, subs: Vec<SubAccess>) -> Arg<V> {
    Arg::Compound { base, subs }
}

/// A tagged argument: `In(x)`, `Out(x)`, or `InOut(x)`, where `x` may be a
/// plain value or `deps(base, subs)`.
#[derive(Debug, Clone)]
pub enum Access<V> {
    In(Arg<V>),
    Out(Arg<V>),
    InOut(Arg<V>),
}

impl<V> Access<V> {
    pub fn access_tag(&self) -> AccessTag {
        match self {
            Access::In(_) => AccessTag::IN,
            Access::Out(_) => AccessTag::OUT,
            Access::InOut(_) => AccessTag::INOUT,
        }
    }

    fn arg(&self) -> &Arg<V> {
        match self {
            Access::In(a) | Access::Out(a) | Access::InOut(a) => a,
        }
    }
}

/// An argument with no annotation defaults to `In` (spec.md §4.1).
impl<V> From<V> for Access<V> {
    fn from(v: V) -> Access<V> {
        Access::In(Arg::Value(v))
    }
}

pub fn in_<V>(x: impl Into<Arg<V>>) -> Access<V> {
    Access::In(x.into())
}

pub fn out<V>(x: impl Into<Arg<V>>) -> Access<V> {
    Access::Out(x.into())
}

pub fn inout<V>(x: impl Into<Arg<V>>) -> Access<V> {
    Access::InOut(x.into())
}

/// The `(value, tag, sub-accesses)` triple unwrapping an access tag yields
/// (spec.md §4.1): "unwrapping yields `(unwrapped_value, (read, write))`;
/// for `Deps` it additionally yields the list of sub-access pairs." This is
/// the shape the dependency recorder (C3) resolves spans against, keyed by
/// the type-erased `ValueId` rather than the original `V` since that is all
/// a heterogeneous argument list has left once erased into `AnyAccess`.
#[derive(Debug, Clone)]
pub struct Unwrapped {
    pub value: ValueId,
    pub tag: AccessTag,
    pub subs: Option<Vec<SubAccess>>,
}

/// Type-erased view over an `Access<V>`, the shape the dependency recorder
/// actually consumes — one positional argument at a time, regardless of
/// what concrete value type `V` each argument wraps.
pub trait AnyAccess: fmt::Debug {
    fn access_tag(&self) -> AccessTag;
    fn value_id(&self) -> ValueId;
    fn sub_accesses(&self) -> &[SubAccess];
    /// `Some` iff the wrapped value is itself a (possibly unstarted) task
    /// handle; C3 resolves started handles to their underlying data object
    /// and defers span computation for unstarted ones (spec.md §4.2, §9).
    fn as_task_handle(&self) -> Option<TaskHandle>;

    /// Unwraps this access into the `(value, tag, sub-accesses)` triple
    /// spec.md §4.1 describes. A default method over the three accessors
    /// above, since every `AnyAccess` implementor already has to provide
    /// them.
    fn unwrap(&self) -> Unwrapped {
        let subs = self.sub_accesses();
        Unwrapped {
            value: self.value_id(),
            tag: self.access_tag(),
            subs: if subs.is_empty() { None } else { Some(subs.to_vec()) },
        }
    }
}

impl<V: TrackedValue + fmt::Debug> AnyAccess for Access<V> {
    fn access_tag(&self) -> AccessTag {
        Access::access_tag(self)
    }

    fn value_id(&self) -> ValueId {
        self.arg().base().value_id()
    }

    fn sub_accesses(&self) -> &[SubAccess] {
        self.arg().subs()
    }

    fn as_task_handle(&self) -> Option<TaskHandle> {
        self.arg().base().as_task_handle()
    }
}
