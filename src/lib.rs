//! chalkboard — collaborative whiteboard core.
//!
//! Networked peers draw on a shared canvas. Every mutation is a [`command::Command`]
//! sent through a central relay that fans it out to all other peers; each peer
//! folds the stream into an ordered, undoable action history via its
//! [`replica::Replica`]. The relay holds no drawing state and never interprets
//! commands beyond decoding them.
//!
//! The GUI canvas/toolbar and low-level transport are external collaborators:
//! rendering consumes `Replica::current_drawable`, gestures drive the replica's
//! pointer and tool methods, and [`peer::Peer`] wires a replica to the relay.

pub mod command;
pub mod peer;
pub mod registry;
pub mod replica;
pub mod routes;
pub mod state;
