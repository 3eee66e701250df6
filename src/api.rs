use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::AuthSession;
use crate::auth::{Permission, User};
use crate::db::{
    add_comment, authenticate_user, check_enrolled, course_exists, create_auth_session,
    create_course, create_session, delete_comment, delete_course, delete_session_by_id,
    delete_user, delete_video, enroll, get_all_courses, get_comments, get_course,
    get_course_video_url, get_courses_by_owner, get_messages, get_sessions_by_course, get_user,
    get_user_enrollments, get_user_profile, get_video, invalidate_auth_session, register_user,
    search_courses_by_name, send_message, session_exists, update_course, update_email,
    update_password, update_profile_pic, update_session, update_user_role, update_username,
    upload_video, user_exists_by_email, user_exists_by_username, withdraw,
};
use crate::error::AppError;
use crate::models::{Comment, Course, Session, Video};
use crate::validation::AppErrorExt;
use crate::validation::JsonValidateExt;
use crate::validation::PermissionCheckExt;
use crate::validation::ToValidationResponse;
use crate::validation::ValidationResponse;
use crate::validation::validate_time_of_day;

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: Option<UserData>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserData {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub profile_pic: String,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            profile_pic: user.profile_pic.clone(),
        }
    }
}

#[derive(Deserialize, Validate, Clone)]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    username: String,
    #[validate(email(message = "Invalid email address"))]
    email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
    #[serde(default)]
    profile_pic: String,
}

#[post("/register", data = "<registration>")]
pub async fn api_register_user(
    registration: Json<RegisterRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<UserData>>, Custom<Json<ValidationResponse>>> {
    let validated = registration.validate_custom()?;

    if user_exists_by_username(db, &validated.username)
        .await
        .validate_custom()?
    {
        return Err(Custom(
            Status::Conflict,
            Json(ValidationResponse::with_error(
                "username",
                "Username already exists",
            )),
        ));
    }

    if user_exists_by_email(db, &validated.email)
        .await
        .validate_custom()?
    {
        return Err(Custom(
            Status::Conflict,
            Json(ValidationResponse::with_error(
                "email",
                "An account already exists for this email address",
            )),
        ));
    }

    let user = register_user(
        db,
        &validated.username,
        &validated.email,
        &validated.password,
        &validated.profile_pic,
    )
    .await
    .validate_custom()?;

    Ok(Custom(Status::Created, Json(UserData::from(user))))
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<LoginResponse>, Custom<Json<ValidationResponse>>> {
    use chrono::Utc;
    use rocket::http::{Cookie, SameSite};

    let validated = login.validate_custom()?;

    match authenticate_user(db, &validated.username, &validated.password)
        .await
        .validate_custom()?
    {
        Some(user) => {
            let token = AuthSession::generate_token();
            let expires_at = Utc::now() + chrono::Duration::hours(1);

            create_auth_session(db, user.id, &token, expires_at.naive_utc())
                .await
                .validate_custom()?;

            let cookie = Cookie::build(("session_token", token))
                .same_site(SameSite::Lax)
                .http_only(true)
                .max_age(rocket::time::Duration::hours(1));
            cookies.add_private(cookie);

            cookies.add_private(
                Cookie::build(("logged_in", validated.username))
                    .same_site(SameSite::Lax)
                    .max_age(rocket::time::Duration::hours(1)),
            );

            Ok(Json(LoginResponse {
                success: true,
                user: Some(UserData::from(user)),
                error: None,
            }))
        }
        None => Ok(Json(LoginResponse {
            success: false,
            user: None,
            error: Some("Invalid username or password".to_string()),
        })),
    }
}

#[post("/logout")]
pub async fn api_logout(
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Status {
    let token = cookies
        .get_private("session_token")
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        let _ = invalidate_auth_session(db, &token).await;
    }

    cookies.remove_private(rocket::http::Cookie::build("session_token"));
    cookies.remove_private(rocket::http::Cookie::build("logged_in"));

    Status::Ok
}

#[get("/me")]
pub async fn api_me(user: User) -> Json<UserData> {
    Json(UserData::from(user))
}

#[get("/me", rank = 2)]
pub async fn api_me_unauthorized() -> Status {
    Status::Unauthorized
}

#[get("/profile")]
pub async fn api_get_profile(user: User, db: &State<Pool<Sqlite>>) -> Result<Json<UserData>, Status> {
    let profile = get_user_profile(db, &user.username).await?;

    Ok(Json(UserData::from(profile)))
}

#[derive(Deserialize, Validate, Clone)]
pub struct UsernameUpdateRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    new_username: String,
}

#[put("/profile/username", data = "<update>")]
pub async fn api_update_username(
    update: Json<UsernameUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    let validated = update.validate_custom()?;

    update_username(db, &user.username, &validated.new_username)
        .await
        .validate_custom()?;

    Ok(Status::Ok)
}

#[derive(Deserialize, Validate, Clone)]
pub struct EmailUpdateRequest {
    #[validate(email(message = "Invalid email address"))]
    new_email: String,
}

#[put("/profile/email", data = "<update>")]
pub async fn api_update_email(
    update: Json<EmailUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    let validated = update.validate_custom()?;

    update_email(db, &user.username, &validated.new_email)
        .await
        .validate_custom()?;

    Ok(Status::Ok)
}

#[derive(Deserialize, Validate)]
pub struct PasswordChangeRequest {
    current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    new_password: String,
}

#[put("/profile/password", data = "<password>")]
pub async fn api_change_password(
    password: Json<PasswordChangeRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    let validated = password.validate_custom()?;

    let is_valid = authenticate_user(db, &user.username, &validated.current_password)
        .await
        .validate_custom()?;

    match is_valid {
        Some(_) => {
            update_password(db, &user.username, &validated.new_password)
                .await
                .validate_custom()?;

            Ok(Status::Ok)
        }
        _ => Err(Custom(
            Status::Unauthorized,
            Json(ValidationResponse::with_error(
                "current_password",
                "Current password is incorrect",
            )),
        )),
    }
}

#[derive(Deserialize, Validate, Clone)]
pub struct ProfilePicUpdateRequest {
    #[validate(length(min = 1, message = "Profile picture is required"))]
    profile_pic: String,
}

#[derive(Serialize, Deserialize)]
pub struct ProfilePicUpdateResponse {
    pub old_profile_pic: String,
}

#[put("/profile/picture", data = "<update>")]
pub async fn api_update_profile_pic(
    update: Json<ProfilePicUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ProfilePicUpdateResponse>, Custom<Json<ValidationResponse>>> {
    let validated = update.validate_custom()?;

    let old_profile_pic = update_profile_pic(db, &user.username, &validated.profile_pic)
        .await
        .validate_custom()?;

    Ok(Json(ProfilePicUpdateResponse { old_profile_pic }))
}

#[get("/courses")]
pub async fn api_get_all_courses(db: &State<Pool<Sqlite>>) -> Result<Json<Vec<Course>>, Status> {
    let courses = get_all_courses(db).await?;

    Ok(Json(courses))
}

#[get("/courses/<id>")]
pub async fn api_get_course(id: i64, db: &State<Pool<Sqlite>>) -> Result<Json<Course>, Status> {
    let course = get_course(db, id).await?;

    Ok(Json(course))
}

#[get("/courses/search?<name>")]
pub async fn api_search_courses(
    name: &str,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Course>>, Status> {
    let courses = search_courses_by_name(db, name).await?;

    Ok(Json(courses))
}

#[get("/my-courses")]
pub async fn api_get_my_courses(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Course>>, Status> {
    let courses = get_courses_by_owner(db, &user.username).await?;

    Ok(Json(courses))
}

#[derive(Deserialize, Validate, Clone)]
pub struct CourseCreateRequest {
    #[validate(length(min = 1, message = "Course name is required"))]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: String,
}

#[post("/courses", data = "<course>")]
pub async fn api_create_course(
    course: Json<CourseCreateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Course>>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageCourses)
        .validate_custom()?;

    let validated = course.validate_custom()?;

    let created = create_course(
        db,
        &validated.name,
        &validated.description,
        &validated.image,
        &user.username,
    )
    .await
    .validate_custom()?;

    Ok(Custom(Status::Created, Json(created)))
}

#[derive(Deserialize, Validate, Clone)]
pub struct CourseUpdateRequest {
    #[validate(length(min = 1, message = "Course name is required"))]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    video_url: String,
}

#[derive(Serialize, Deserialize)]
pub struct CourseUpdateResponse {
    pub rows_affected: u64,
    pub old_image: String,
}

#[put("/courses/<id>", data = "<course>")]
pub async fn api_update_course(
    id: i64,
    course: Json<CourseUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<CourseUpdateResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageCourses)
        .validate_custom()?;

    let validated = course.validate_custom()?;

    let (rows_affected, old_image) = update_course(
        db,
        id,
        &validated.name,
        &validated.description,
        &validated.image,
        &validated.video_url,
    )
    .await
    .validate_custom()?;

    Ok(Json(CourseUpdateResponse {
        rows_affected,
        old_image,
    }))
}

#[delete("/courses/<id>")]
pub async fn api_delete_course(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Status> {
    user.require_permission(Permission::ManageCourses)?;

    if !course_exists(db, id).await? {
        return Err(AppError::CourseNotFound(id).into());
    }

    delete_course(db, id).await?;

    Ok(Status::Ok)
}

#[get("/courses/<course_id>/sessions")]
pub async fn api_get_course_sessions(
    course_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Session>>, Status> {
    let sessions = get_sessions_by_course(db, course_id).await?;

    Ok(Json(sessions))
}

#[derive(Deserialize, Validate, Clone)]
pub struct SessionCreateRequest {
    #[validate(custom(function = validate_time_of_day))]
    start_time: String,
    #[validate(custom(function = validate_time_of_day))]
    end_time: String,
}

#[derive(Serialize, Deserialize)]
pub struct SessionCreatedResponse {
    pub session_id: i64,
}

#[post("/courses/<course_id>/sessions", data = "<session>")]
pub async fn api_create_session(
    course_id: i64,
    session: Json<SessionCreateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<SessionCreatedResponse>>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageSessions)
        .validate_custom()?;

    let validated = session.validate_custom()?;

    if !course_exists(db, course_id).await.validate_custom()? {
        return Err(AppError::CourseNotFound(course_id).to_validation_response());
    }

    let session_id = create_session(
        db,
        course_id,
        &validated.start_time,
        &validated.end_time,
        &user.username,
    )
    .await
    .validate_custom()?;

    Ok(Custom(
        Status::Created,
        Json(SessionCreatedResponse { session_id }),
    ))
}

#[derive(Deserialize, Validate, Clone)]
pub struct SessionUpdateRequest {
    course_id: i64,
    #[validate(custom(function = validate_time_of_day))]
    start_time: String,
    #[validate(custom(function = validate_time_of_day))]
    end_time: String,
}

#[put("/sessions/<id>", data = "<session>")]
pub async fn api_update_session(
    id: i64,
    session: Json<SessionUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageSessions)
        .validate_custom()?;

    let validated = session.validate_custom()?;

    if !session_exists(db, id).await.validate_custom()? {
        return Err(AppError::SessionNotFound(id).to_validation_response());
    }

    if !course_exists(db, validated.course_id)
        .await
        .validate_custom()?
    {
        return Err(AppError::CourseNotFound(validated.course_id).to_validation_response());
    }

    let rows = update_session(
        db,
        id,
        validated.course_id,
        &validated.start_time,
        &validated.end_time,
    )
    .await
    .validate_custom()?;

    match rows {
        0 => Ok(Status::NotFound),
        _ => Ok(Status::Ok),
    }
}

#[delete("/sessions/<id>")]
pub async fn api_delete_session(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Status> {
    user.require_permission(Permission::ManageSessions)?;

    let rows = delete_session_by_id(db, id).await?;

    match rows {
        0 => Ok(Status::NotFound),
        _ => Ok(Status::Ok),
    }
}

#[derive(Serialize, Deserialize)]
pub struct EnrollResponse {
    pub success: bool,
    pub message: String,
}

#[post("/courses/<course_id>/enroll")]
pub async fn api_enroll(
    course_id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<EnrollResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::EnrollCourses)
        .validate_custom()?;

    if !course_exists(db, course_id).await.validate_custom()? {
        return Err(AppError::CourseNotFound(course_id).to_validation_response());
    }

    if check_enrolled(db, &user.username, course_id)
        .await
        .validate_custom()?
    {
        return Err(Custom(
            Status::Conflict,
            Json(ValidationResponse::with_error(
                "enrollment",
                "You're already enrolled in this course",
            )),
        ));
    }

    enroll(db, course_id, &user.username)
        .await
        .validate_custom()?;

    Ok(Json(EnrollResponse {
        success: true,
        message: "Enrollment successful".to_string(),
    }))
}

#[derive(Serialize, Deserialize)]
pub struct WithdrawResponse {
    pub success: bool,
}

#[post("/courses/<course_id>/withdraw")]
pub async fn api_withdraw(
    course_id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<WithdrawResponse>, Status> {
    let success = withdraw(db, &user.username, course_id).await?;

    Ok(Json(WithdrawResponse { success }))
}

#[get("/enrollments")]
pub async fn api_get_enrollments(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Course>>, Status> {
    let courses = get_user_enrollments(db, &user.username).await?;

    Ok(Json(courses))
}

#[derive(Serialize, Deserialize)]
pub struct EnrollmentStatusResponse {
    pub enrolled: bool,
}

#[get("/courses/<course_id>/enrollment")]
pub async fn api_check_enrolled(
    course_id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<EnrollmentStatusResponse>, Status> {
    let enrolled = check_enrolled(db, &user.username, course_id).await?;

    Ok(Json(EnrollmentStatusResponse { enrolled }))
}

#[get("/courses/<course_id>/comments")]
pub async fn api_get_comments(
    course_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Comment>>, Status> {
    let comments = get_comments(db, course_id).await?;

    Ok(Json(comments))
}

#[derive(Deserialize, Validate, Clone)]
pub struct CommentRequest {
    #[validate(length(min = 1, message = "Comment text is required"))]
    comment: String,
}

#[post("/courses/<course_id>/comments", data = "<request>")]
pub async fn api_add_comment(
    course_id: i64,
    request: Json<CommentRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::PostComments)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    if !course_exists(db, course_id).await.validate_custom()? {
        return Err(AppError::CourseNotFound(course_id).to_validation_response());
    }

    add_comment(db, &user.username, course_id, &validated.comment)
        .await
        .validate_custom()?;

    Ok(Status::Created)
}

#[delete("/courses/<course_id>/comments/<comment_id>")]
pub async fn api_delete_comment(
    course_id: i64,
    comment_id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Status> {
    let deleted = delete_comment(db, comment_id, &user.username, course_id).await?;

    match deleted {
        true => Ok(Status::Ok),
        false => Ok(Status::NotFound),
    }
}

#[derive(Serialize, Deserialize)]
pub struct CourseVideoResponse {
    pub url: String,
}

#[get("/courses/<course_id>/video")]
pub async fn api_get_course_video(
    course_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<CourseVideoResponse>, Status> {
    let url = get_course_video_url(db, course_id).await?;

    Ok(Json(CourseVideoResponse { url }))
}

#[get("/videos/<id>")]
pub async fn api_get_video(id: i64, db: &State<Pool<Sqlite>>) -> Result<Json<Video>, Status> {
    let video = get_video(db, id).await?;

    Ok(Json(video))
}

#[derive(Deserialize, Validate, Clone)]
pub struct VideoUploadRequest {
    #[validate(length(min = 1, message = "Video title is required"))]
    title: String,
    #[validate(length(min = 1, message = "Video URL is required"))]
    url: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    description: String,
}

#[derive(Serialize, Deserialize)]
pub struct VideoUploadedResponse {
    pub video_id: i64,
}

#[post("/videos", data = "<video>")]
pub async fn api_upload_video(
    video: Json<VideoUploadRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<VideoUploadedResponse>>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::UploadVideos)
        .validate_custom()?;

    let validated = video.validate_custom()?;

    let video_id = upload_video(
        db,
        &user.username,
        &validated.title,
        &validated.url,
        &validated.duration,
        &validated.description,
    )
    .await
    .validate_custom()?;

    Ok(Custom(
        Status::Created,
        Json(VideoUploadedResponse { video_id }),
    ))
}

#[delete("/videos/<id>")]
pub async fn api_delete_video(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Status> {
    user.require_permission(Permission::UploadVideos)?;

    let deleted = delete_video(db, id).await?;

    match deleted {
        true => Ok(Status::Ok),
        false => Ok(Status::NotFound),
    }
}

#[derive(Deserialize, Validate, Clone)]
pub struct ContactRequest {
    #[validate(email(message = "Invalid email address"))]
    email: String,
    #[validate(length(min = 1, message = "Subject is required"))]
    subject: String,
    #[validate(length(min = 1, message = "Message text is required"))]
    message: String,
    #[serde(default)]
    username: String,
}

#[post("/contact", data = "<request>")]
pub async fn api_send_contact_message(
    request: Json<ContactRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    let validated = request.validate_custom()?;

    send_message(
        db,
        &validated.email,
        &validated.subject,
        &validated.message,
        &validated.username,
    )
    .await
    .validate_custom()?;

    Ok(Status::Created)
}

#[get("/admin/contact-messages")]
pub async fn api_get_contact_messages(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<crate::models::ContactMessage>>, Status> {
    user.require_permission(Permission::ViewContactMessages)?;

    let messages = get_messages(db).await?;

    Ok(Json(messages))
}

#[derive(Deserialize, Validate, Clone)]
pub struct RoleUpdateRequest {
    #[validate(length(min = 1, message = "Role is required"))]
    role: String,
}

#[put("/admin/users/<id>/role", data = "<update>")]
pub async fn api_update_user_role(
    id: i64,
    update: Json<RoleUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::EditUserRoles)
        .validate_custom()?;

    let validated = update.validate_custom()?;

    if crate::auth::Role::from_str(&validated.role).is_err() {
        return Err(Custom(
            Status::UnprocessableEntity,
            Json(ValidationResponse::with_error("role", "Unknown role")),
        ));
    }

    get_user(db, id).await.validate_custom()?;

    update_user_role(db, id, &validated.role)
        .await
        .validate_custom()?;

    Ok(Status::Ok)
}

#[delete("/admin/users/<id>")]
pub async fn api_delete_user(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Status> {
    user.require_permission(Permission::DeleteUsers)?;

    delete_user(db, id).await?;

    Ok(Status::Ok)
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
