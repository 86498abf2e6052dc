//! Principal matching.
//!
//! [`matches`] is the pure, scheme-agnostic evaluation of a principal against
//! an identity's public attributes. [`satisfy`] is the driver providers use:
//! it walks combined principals and hands every leaf either to [`matches`] or
//! to the provider, depending on what the provider declared for that kind.

use crate::{Combinator, Evaluation, Identity, Msp, MspError, Principal};

/// Generic evaluation of `principal` against `identity`.
///
/// Role markers are organizational units named after the role. Unit and
/// certifier comparisons are exact. Combined principals short-circuit left to
/// right; an empty `All` is true and an empty `Any` is false.
pub fn matches(identity: &dyn Identity, principal: &Principal) -> bool {
    match principal {
        Principal::Role { msp, role } => {
            identity.msp_identifier() == msp
                && identity
                    .organizational_units()
                    .iter()
                    .any(|ou| ou.unit == role.as_str())
        }
        Principal::OrganizationalUnit {
            msp,
            certifier,
            unit,
        } => {
            identity.msp_identifier() == msp
                && identity
                    .organizational_units()
                    .iter()
                    .any(|ou| &ou.certifier == certifier && &ou.unit == unit)
        }
        Principal::Identity(serialized) => identity.serialize() == *serialized,
        Principal::Anonymity { anonymous } => identity.anonymous() == *anonymous,
        Principal::Combined {
            combinator: Combinator::All,
            principals,
        } => principals.iter().all(|p| matches(identity, p)),
        Principal::Combined {
            combinator: Combinator::Any,
            principals,
        } => principals.iter().any(|p| matches(identity, p)),
    }
}

/// Evaluate `principal` against `identity` on behalf of `msp`.
///
/// Does not check that `identity` belongs to `msp` nor validate it; see
/// [`Msp::satisfies_principal`] for the full check.
pub fn satisfy<M>(msp: &M, identity: &dyn Identity, principal: &Principal) -> Result<(), MspError>
where
    M: Msp + ?Sized,
{
    let kind = principal.kind();
    if !msp.version().supports(kind) {
        return Err(MspError::mismatch(format!(
            "{kind:?} principals are not supported by {:?} providers",
            msp.version()
        )));
    }

    match principal {
        Principal::Combined {
            combinator: Combinator::All,
            principals,
        } => {
            for (index, principal) in principals.iter().enumerate() {
                satisfy(msp, identity, principal).map_err(|error| {
                    MspError::mismatch(format!("sub-principal {index} not satisfied: {error}"))
                })?;
            }
            Ok(())
        }
        Principal::Combined {
            combinator: Combinator::Any,
            principals,
        } => {
            if principals
                .iter()
                .any(|principal| satisfy(msp, identity, principal).is_ok())
            {
                Ok(())
            } else {
                Err(MspError::mismatch(format!(
                    "none of {} alternatives satisfied",
                    principals.len()
                )))
            }
        }
        leaf => match msp.evaluation(kind) {
            Evaluation::Generic if matches(identity, leaf) => Ok(()),
            Evaluation::Generic => Err(MspError::mismatch(format!(
                "{} does not satisfy {kind:?} principal",
                identity.identifier()
            ))),
            Evaluation::Scheme => msp.satisfies_scheme_principal(identity, leaf),
        },
    }
}
