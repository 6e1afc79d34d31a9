use tagframe_types::FrameError;

mod arrays;
mod descriptors;
mod objects;
mod primitives;
mod walk;

pub fn frame_error(err: &anyhow::Error) -> Option<&FrameError> {
    err.downcast_ref::<FrameError>()
}
