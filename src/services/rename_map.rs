use crate::models::{BinaryRenameMap, ContentBlock, UploadedFile};

/// Points every media block at the file that was uploaded for it.
///
/// Blocks are matched to uploads by `fileDetails.name == originalname`. A
/// matched block gets the generated filename as its url; an unmatched one
/// (or one without `fileDetails` or a name in it) has its url cleared, so no block keeps a
/// reference to a file that did not arrive with this request.
pub fn build_binary_rename_map(
    blocks: &mut [ContentBlock],
    files: &[UploadedFile],
) -> BinaryRenameMap {
    let mut renames = BinaryRenameMap::new();

    for block in blocks.iter_mut().filter(|b| b.block_type.is_media()) {
        let uploaded = block.file_details.as_ref().and_then(|details| {
            files
                .iter()
                .find(|file| details.name.as_deref() == Some(file.originalname.as_str()))
        });

        match uploaded {
            Some(file) => {
                block.set_media_url(Some(file.filename.clone()));
                renames.insert(file.originalname.clone(), file.filename.clone());
            }
            None => block.set_media_url(None),
        }
    }

    renames
}
