pub mod final_rating;
pub mod participant;
pub mod peer_vote;
pub mod round;
pub mod submission;
