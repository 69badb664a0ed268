// gigscout-listener: the `gigscout` binary's library half.
//
// Architecture:
//   main → Runner::execute → run / keywords / listings
//   run  → SessionSupervisor (scraper task) + Relay + BotListener
//   SessionSupervisor → SessionController, then per pass:
//       PaginationWalker → matcher → NoveltyGate → Applicator, then InvitationScanner

pub mod applicator;
pub mod bot_listener;
pub mod command_settings;
pub mod error_throttler;
pub mod invitation_scanner;
pub mod isolated_tab;
pub mod matcher;
pub mod novelty_gate;
pub mod pagination_walker;
pub mod relay;
pub mod runner;
pub mod session_controller;
pub mod session_supervisor;
pub mod site;
