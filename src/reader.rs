use crate::atoms::{Atom, FileTypeAtom};
use crate::boxes::{BoxHeader, FTYP, FourCC};
use crate::decode::{decode_atom, decode_file_type};
use crate::known_boxes::KnownAtom;
use crate::parser::{ParseError, Result, read_box_header, skip_payload, try_read_box_header};
use crate::program::{Directive, Op};
use std::io::Read;
use tracing::{debug, trace, warn};

/// Everything one traversal produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The leading `ftyp`, which validates the stream but is never emitted
    /// as an atom.
    pub file_type: FileTypeAtom,
    /// One record per `read` directive, in directive order.
    pub atoms: Vec<Atom>,
}

/// Walks `r` according to `directives` and returns the atoms the `read`
/// directives asked for.
///
/// The source is consumed strictly forward and may be left positioned in the
/// middle of the stream once the last directive has run.
pub fn execute<R: Read>(r: &mut R, directives: &[Directive]) -> Result<Vec<Atom>> {
    execute_with_file_type(r, directives).map(|e| e.atoms)
}

/// Like [`execute`], also returning the decoded `ftyp`.
pub fn execute_with_file_type<R: Read>(r: &mut R, directives: &[Directive]) -> Result<Extraction> {
    let h = read_box_header(r)?;
    if h.typ != FTYP {
        return Err(ParseError::NotQuickTime { found: h.typ });
    }
    let file_type = decode_file_type(r, &h)?;
    debug!(
        major = %file_type.major_brand(),
        quicktime = file_type.is_quicktime(),
        "file type"
    );

    let mut atoms = Vec::new();
    for (i, d) in directives.iter().enumerate() {
        let h = find_sibling(r, d.tag)?;
        debug!(index = i, directive = %d, size = h.size, "executing");
        match d.op {
            Op::Read => atoms.push(decode_atom(r, &h)?),
            Op::StepInto => {
                if !KnownAtom::from(h.typ).is_container() {
                    warn!(typ = %h.typ, "stepping into an atom that is not a known container");
                }
            }
            Op::Skip => skip_payload(r, &h)?,
        }
    }
    Ok(Extraction { file_type, atoms })
}

/// Scans forward over siblings until one carries `tag`, leaving the source
/// just past that atom's header.
fn find_sibling<R: Read>(r: &mut R, tag: FourCC) -> Result<BoxHeader> {
    loop {
        let Some(h) = try_read_box_header(r)? else {
            return Err(ParseError::TargetNotFound { tag });
        };
        if h.typ == tag {
            return Ok(h);
        }
        trace!(typ = %h.typ, size = h.size, wanted = %tag, "skipping sibling");
        skip_payload(r, &h)?;
    }
}
