mod forwarding;
mod ospf_election;
mod ospf_neighbor;
mod routing_table;
mod scenario_spec;
mod sim_time;
mod simulator;
