//! Termination policies of services, workers and jobs.
//!
//! One routine serves all three shapes. The shape's [`TerminationKind`]
//! decides which fields are read and written, so adding a kind is a
//! compile-checked change to the matches below.

use crate::config::reader::Node;
use crate::config::schema::{DRAIN_SECONDS, GRACE_PERIOD_SECONDS};
use crate::config::value::{ConfigMap, MapBuilder};
use crate::error::EncodeResult;
use crate::spec::{TerminationFields, TerminationKind, TerminationShape};

/// Reads a `termination` block into the policy shape `T`.
///
/// Fields that do not apply to `T`'s kind are ignored. A block that sets
/// none of `T`'s fields reads as no policy at all.
pub(crate) fn encode_termination<T: TerminationShape>(node: &Node<'_>) -> EncodeResult<Option<T>> {
    let grace_period_seconds = node.opt_i32_in("grace_period_seconds", GRACE_PERIOD_SECONDS)?;
    let drain_seconds = match T::KIND {
        TerminationKind::Service => node.opt_i32_in("drain_seconds", DRAIN_SECONDS)?,
        TerminationKind::Worker | TerminationKind::Job => None,
    };
    if grace_period_seconds.is_none() && drain_seconds.is_none() {
        return Ok(None);
    }
    Ok(Some(T::from_fields(TerminationFields {
        grace_period_seconds,
        drain_seconds,
    })))
}

/// Writes a termination policy of shape `T`.
pub(crate) fn decode_termination<T: TerminationShape>(termination: &T) -> ConfigMap {
    let fields = termination.fields();
    let builder = MapBuilder::new().opt("grace_period_seconds", fields.grace_period_seconds);
    let builder = match T::KIND {
        TerminationKind::Service => builder.opt("drain_seconds", fields.drain_seconds),
        TerminationKind::Worker | TerminationKind::Job => builder,
    };
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::reader::ExclusivePolicy;
    use crate::error::EncodeError;
    use crate::spec::{JobTermination, ServiceTermination, WorkerTermination};

    fn tree(yaml: &str) -> ConfigMap {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_service_keeps_drain_worker_drops_it() {
        let fields = tree("grace_period_seconds: 30\ndrain_seconds: 20\n");
        let node = Node::root(&fields, "termination", ExclusivePolicy::default());

        let service: ServiceTermination = encode_termination(&node).unwrap().unwrap();
        assert_eq!(service.grace_period_seconds, Some(30));
        assert_eq!(service.drain_seconds, Some(20));

        let worker: WorkerTermination = encode_termination(&node).unwrap().unwrap();
        assert_eq!(worker.grace_period_seconds, Some(30));
        assert_eq!(decode_termination(&worker), tree("grace_period_seconds: 30\n"));
    }

    #[test]
    fn test_worker_ignores_invalid_drain() {
        let fields = tree("grace_period_seconds: 30\ndrain_seconds: 500\n");
        let node = Node::root(&fields, "termination", ExclusivePolicy::default());
        assert!(encode_termination::<JobTermination>(&node).is_ok());
        assert!(matches!(
            encode_termination::<ServiceTermination>(&node),
            Err(EncodeError::OutOfRange { value: 500, min: 1, max: 110, .. })
        ));
    }

    #[test]
    fn test_grace_period_bounds() {
        for (value, ok) in [(0, false), (1, true), (600, true), (601, false)] {
            let fields = tree(&format!("grace_period_seconds: {value}\n"));
            let node = Node::root(&fields, "termination", ExclusivePolicy::default());
            assert_eq!(
                encode_termination::<WorkerTermination>(&node).is_ok(),
                ok,
                "grace period {value}"
            );
        }
    }

    #[test]
    fn test_service_round_trip() {
        let fields = tree("grace_period_seconds: 45\ndrain_seconds: 15\n");
        let node = Node::root(&fields, "termination", ExclusivePolicy::default());
        let service: ServiceTermination = encode_termination(&node).unwrap().unwrap();
        assert_eq!(decode_termination(&service), fields);
    }

    #[test]
    fn test_empty_block_is_no_policy() {
        let fields = ConfigMap::new();
        let node = Node::root(&fields, "termination", ExclusivePolicy::default());
        assert_eq!(encode_termination::<ServiceTermination>(&node).unwrap(), None);

        let fields = tree("drain_seconds: 20\n");
        let node = Node::root(&fields, "termination", ExclusivePolicy::default());
        assert_eq!(encode_termination::<WorkerTermination>(&node).unwrap(), None);
        assert!(encode_termination::<ServiceTermination>(&node).unwrap().is_some());
    }
}
