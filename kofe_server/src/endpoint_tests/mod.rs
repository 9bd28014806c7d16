mod board;
mod helpers;
mod mocks;
