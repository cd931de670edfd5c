pub mod attendance;
pub mod material;
pub mod schedule;
pub mod user;
pub mod validation;

pub use attendance::{Attendance, AttendanceQuery, AttendanceStatus, SubmitAttendanceRequest};
pub use material::{Material, MaterialChanges, MaterialRequest, NewMaterial, Priority};
pub use schedule::{MySchedule, NewSchedule, NewScheduleRequest, Schedule, ScheduleChanges, UpdateScheduleRequest};
pub use user::{
    Credential, LoginRequest, LoginResponse, NewUser, NewUserRequest, UpdateUserRequest, User, UserChanges,
    UserListQuery, UserProfile,
};
