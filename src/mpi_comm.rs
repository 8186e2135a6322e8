//! MPI communicators
use crate::{
    error::{Error, Result},
    traits::Comm,
    types::RingMessage,
};
use mpi::{
    collective::CommunicatorCollectives,
    point_to_point::{Destination, Source},
    topology::{Color, Communicator, SimpleCommunicator},
    traits::Equivalence,
};

fn check_rank(comm: &SimpleCommunicator, rank: i32) -> Result<()> {
    if rank < 0 || rank >= Communicator::size(comm) {
        Err(Error::InvalidRank(rank))
    } else {
        Ok(())
    }
}

impl Comm for SimpleCommunicator {
    type Sub = SimpleCommunicator;

    fn rank(&self) -> i32 {
        Communicator::rank(self)
    }

    fn size(&self) -> i32 {
        Communicator::size(self)
    }

    fn synchronous_send(&self, dest: i32, tag: i32, message: &RingMessage) -> Result<()> {
        check_rank(self, dest)?;
        self.process_at_rank(dest)
            .synchronous_send_with_tag(&message[..], tag);
        Ok(())
    }

    fn receive(&self, source: i32, tag: i32) -> Result<RingMessage> {
        check_rank(self, source)?;
        let mut message: RingMessage = [0; 2];
        let status = self
            .process_at_rank(source)
            .receive_into_with_tag(&mut message[..], tag);
        let count = status.count(i32::equivalent_datatype());
        if count != message.len() as i32 {
            return Err(Error::Transport {
                peer: source,
                code: count,
            });
        }
        Ok(message)
    }

    fn split(&self, color: i32, key: i32) -> Result<SimpleCommunicator> {
        if color < 0 {
            return Err(Error::SplitFailed { color });
        }
        self.split_by_color_with_key(Color::with_value(color), key)
            .ok_or(Error::SplitFailed { color })
    }

    fn all_gather(&self, value: i32) -> Result<Vec<i32>> {
        let mut values = vec![0; Communicator::size(self) as usize];
        self.all_gather_into(&value, &mut values[..]);
        Ok(values)
    }

    fn release(self) -> Result<()> {
        // Dropping a split communicator frees it
        drop(self);
        Ok(())
    }

    fn abort(&self, code: i32) -> ! {
        Communicator::abort(self, code)
    }
}
